//! # RangeVFS SQLite
//!
//! Runs SQL against remote databases without downloading them.
//!
//! [`EngineVfs`] registers a [`rangevfs_core::VfsRegistry`] with the bundled
//! SQLite engine, so every page the engine reads becomes a ranged fetch on
//! the registry's default backend, while journals and temp files land in the
//! memory backend. [`Connection`] and [`Statement`] wrap the engine's
//! connection and statement objects for read-only querying.
//!
//! ## Example
//!
//! ```no_run
//! use rangevfs_core::{LocalFileSource, SystemHost, VfsConfig, VfsRegistry};
//! use rangevfs_sqlite::{Connection, EngineVfs, Value};
//! use std::sync::Arc;
//!
//! let registry = VfsRegistry::standard(
//!     &VfsConfig::default(),
//!     Arc::new(LocalFileSource::new()),
//!     Arc::new(SystemHost::new()),
//! )
//! .unwrap();
//! let vfs = EngineVfs::register(registry).unwrap();
//!
//! let conn = Connection::open_with("data/app.db", vfs).unwrap();
//! let mut stmt = conn.prepare("SELECT name FROM users WHERE id = ?1").unwrap();
//! let result = stmt.query(&[Value::Integer(7)]).unwrap();
//! println!("{:?}", result.rows);
//! ```

#![warn(missing_docs)]

#[allow(unsafe_code)]
mod bridge;
mod connection;
mod error;

pub use bridge::EngineVfs;
pub use connection::{Connection, QueryResult, Statement};
pub use error::{SqliteError, SqliteResult};
pub use rusqlite::types::Value;
