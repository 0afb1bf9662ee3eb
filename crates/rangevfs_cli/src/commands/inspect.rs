//! Inspect command implementation.

use crate::commands::stat::format_size;
use crate::target;
use rangevfs_core::{RangeSource, ReadStatus};
use serde::Serialize;
use std::sync::Arc;

/// Size of the SQLite database header.
pub const HEADER_SIZE: usize = 100;

/// Magic string at the start of every SQLite database.
pub const MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Decoded SQLite database header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqliteHeader {
    /// Whether the magic string matched.
    pub magic_valid: bool,
    /// Page size in bytes.
    pub page_size: u32,
    /// File format write version (1 legacy, 2 WAL).
    pub write_version: u8,
    /// File format read version (1 legacy, 2 WAL).
    pub read_version: u8,
    /// Reserved bytes at the end of each page.
    pub reserved_space: u8,
    /// File change counter.
    pub change_counter: u32,
    /// Database size in pages.
    pub page_count: u32,
    /// First freelist trunk page.
    pub first_freelist_page: u32,
    /// Total freelist pages.
    pub freelist_count: u32,
    /// Schema cookie.
    pub schema_cookie: u32,
    /// Schema format number.
    pub schema_format: u32,
    /// Text encoding name.
    pub text_encoding: String,
    /// User version pragma value.
    pub user_version: u32,
    /// Application id pragma value.
    pub application_id: u32,
    /// Library version that last wrote the file.
    pub library_version: String,
}

impl SqliteHeader {
    /// Decodes the first [`HEADER_SIZE`] bytes of a database.
    pub fn parse(header: &[u8; HEADER_SIZE]) -> Self {
        let u32_at = |offset: usize| {
            u32::from_be_bytes([
                header[offset],
                header[offset + 1],
                header[offset + 2],
                header[offset + 3],
            ])
        };

        let raw_page_size = u16::from_be_bytes([header[16], header[17]]);
        let page_size = match raw_page_size {
            1 => 65_536,
            n => u32::from(n),
        };

        let text_encoding = match u32_at(56) {
            1 => "UTF-8".to_string(),
            2 => "UTF-16le".to_string(),
            3 => "UTF-16be".to_string(),
            0 => "unset".to_string(),
            n => format!("unknown ({n})"),
        };

        let version = u32_at(96);
        let library_version = format!(
            "{}.{}.{}",
            version / 1_000_000,
            (version / 1_000) % 1_000,
            version % 1_000
        );

        Self {
            magic_valid: &header[..16] == MAGIC,
            page_size,
            write_version: header[18],
            read_version: header[19],
            reserved_space: header[20],
            change_counter: u32_at(24),
            page_count: u32_at(28),
            first_freelist_page: u32_at(32),
            freelist_count: u32_at(36),
            schema_cookie: u32_at(40),
            schema_format: u32_at(44),
            text_encoding,
            user_version: u32_at(60),
            application_id: u32_at(68),
            library_version,
        }
    }

    /// Returns the database size implied by page size and count.
    pub fn expected_size(&self) -> u64 {
        u64::from(self.page_size) * u64::from(self.page_count)
    }
}

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Target URL or path.
    pub target: String,
    /// Size reported by the remote.
    pub size: u64,
    /// Decoded header.
    pub header: SqliteHeader,
    /// Whether page size times page count equals the remote size.
    pub size_consistent: bool,
}

/// Reads and decodes the header without printing it.
pub fn collect(
    target_path: &str,
    source: Arc<dyn RangeSource>,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let registry = target::registry(source)?;
    let mut opened = target::open_main(&registry, target_path)?;
    let size = opened.file.file_size()?;

    let mut buf = [0u8; HEADER_SIZE];
    let status = opened.file.read(&mut buf, 0)?;
    opened.file.close()?;

    if let ReadStatus::Short { read } = status {
        return Err(format!(
            "{target_path} is too small for a database header: {read} of {HEADER_SIZE} bytes"
        )
        .into());
    }

    let header = SqliteHeader::parse(&buf);
    Ok(InspectResult {
        target: target_path.to_string(),
        size,
        size_consistent: header.expected_size() == size,
        header,
    })
}

/// Runs the inspect command.
pub fn run(
    target_path: &str,
    source: Arc<dyn RangeSource>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(target_path, source)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    let header = &result.header;
    println!("SQLite Database Header");
    println!("======================");
    println!();
    println!("Target: {}", result.target);
    println!("Size:   {} bytes ({})", result.size, format_size(result.size));
    println!();
    println!("Format:");
    println!("  Magic:           {}", if header.magic_valid { "valid" } else { "INVALID" });
    println!("  Page size:       {}", header.page_size);
    println!("  Page count:      {}", header.page_count);
    println!(
        "  Expected size:   {} bytes{}",
        header.expected_size(),
        if result.size_consistent { "" } else { " (mismatch)" }
    );
    println!("  Write version:   {}", header.write_version);
    println!("  Read version:    {}", header.read_version);
    println!("  Reserved space:  {}", header.reserved_space);
    println!("  Text encoding:   {}", header.text_encoding);
    println!();
    println!("Schema:");
    println!("  Change counter:  {}", header.change_counter);
    println!("  Schema cookie:   {}", header.schema_cookie);
    println!("  Schema format:   {}", header.schema_format);
    println!("  User version:    {}", header.user_version);
    println!("  Application id:  {:#010x}", header.application_id);
    println!();
    println!("Freelist:");
    println!("  First trunk:     {}", header.first_freelist_page);
    println!("  Pages:           {}", header.freelist_count);
    println!();
    println!("Written by SQLite {}", header.library_version);
}
