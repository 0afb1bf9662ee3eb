//! RangeVFS CLI
//!
//! Command-line tools for probing databases served over range requests.
//!
//! # Commands
//!
//! - `stat` - Show size and accessibility of a remote database
//! - `read` - Read a byte window through the VFS and hex-dump it
//! - `inspect` - Decode the SQLite database header
//! - `query` - Run SQL against the database in place
//! - `version` - Show version information

mod commands;
mod target;

use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// RangeVFS command-line tools.
#[derive(Parser)]
#[command(name = "rangevfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(global = true, short, long, default_value = "text")]
    format: String,

    /// HTTP request timeout in seconds
    #[arg(global = true, short, long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show size and accessibility of a database
    Stat {
        /// URL or local path of the database
        target: String,
    },

    /// Read a byte window through the VFS
    Read {
        /// URL or local path of the database
        target: String,

        /// Start offset
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Number of bytes to read
        #[arg(short, long, default_value = "100")]
        amount: usize,
    },

    /// Decode the SQLite database header
    Inspect {
        /// URL or local path of the database
        target: String,
    },

    /// Run a read-only SQL query against the database
    Query {
        /// URL or local path of the database
        target: String,

        /// SQL to run
        sql: String,

        /// Positional bind parameter, repeatable (?1, ?2, ...)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let timeout = Duration::from_secs(cli.timeout);
    match cli.command {
        Commands::Stat { target } => {
            let source = target::source_for(&target, timeout)?;
            commands::stat::run(&target, source, &cli.format)?;
        }
        Commands::Read {
            target,
            offset,
            amount,
        } => {
            let source = target::source_for(&target, timeout)?;
            commands::read::run(&target, source, offset, amount, &cli.format)?;
        }
        Commands::Inspect { target } => {
            let source = target::source_for(&target, timeout)?;
            commands::inspect::run(&target, source, &cli.format)?;
        }
        Commands::Query {
            target,
            sql,
            params,
        } => {
            let source = target::source_for(&target, timeout)?;
            commands::query::run(&target, source, &sql, &params, &cli.format)?;
        }
        Commands::Version => {
            println!("RangeVFS CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("RangeVFS Core v{}", rangevfs_core::VERSION);
        }
    }

    Ok(())
}
