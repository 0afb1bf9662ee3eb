//! # RangeVFS Core
//!
//! Read-only virtual file system layer that lets a SQLite-style engine open a
//! database stored on a remote resource and read it page by page through
//! byte-range requests.
//!
//! This crate provides:
//! - The backend contract ([`Vfs`] and [`VfsFile`])
//! - The range backend ([`RangeVfs`]) serving main databases from a
//!   [`RangeSource`]
//! - A memory backend ([`MemoryVfs`]) for journals and temp files
//! - A service-only underlay ([`UnderlayVfs`])
//! - A registry ([`VfsRegistry`]) that composes backends, routes opens and
//!   resolves services along fallback chains
//!
//! ## Design Principles
//!
//! - The main database is read-only; every mutation fails with its own code
//! - Short reads are zero-filled and reported, never silently padded
//! - Transport and host services sit behind traits, so tests run offline
//! - The registry is an owned value; there is no process-wide state
//!
//! ## Example
//!
//! ```rust
//! use rangevfs_core::{LocalFileSource, OpenFlags, SystemHost, VfsConfig, VfsRegistry};
//! use std::sync::Arc;
//!
//! let registry = VfsRegistry::standard(
//!     &VfsConfig::default(),
//!     Arc::new(LocalFileSource::new()),
//!     Arc::new(SystemHost::new()),
//! )
//! .unwrap();
//!
//! let flags = OpenFlags::READWRITE | OpenFlags::CREATE | OpenFlags::TEMP_JOURNAL;
//! let opened = registry.open(None, flags).unwrap();
//! assert_eq!(opened.backend, "memdb");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod code;
mod config;
mod error;
mod flags;
mod host;
mod local;
pub mod memory;
mod registry;
pub mod remote;
mod time;
pub mod underlay;
mod vfs;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use code::ResultCode;
pub use config::VfsConfig;
pub use error::{TransportError, VfsError, VfsResult};
pub use flags::{
    AccessFlags, AccessMode, Capabilities, DeviceCharacteristics, LockLevel, OpenFlags, Service,
    SyncFlags,
};
pub use host::{HostServices, RangeSource, RemoteStat, SystemHost};
pub use local::LocalFileSource;
pub use memory::{MemoryFile, MemoryVfs};
pub use registry::{Registration, VfsRegistry};
pub use remote::{RangeFile, RangeVfs};
pub use time::{julian_days, julian_millis, MILLIS_PER_DAY, UNIX_EPOCH_JULIAN_MILLIS};
pub use underlay::UnderlayVfs;
pub use vfs::{
    write_c_message, DlHandle, DlSymbol, OpenedFile, ReadStatus, Vfs, VfsFile,
    DL_UNSUPPORTED_MESSAGE,
};
