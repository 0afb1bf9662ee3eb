//! # RangeVFS Testkit
//!
//! Test utilities for RangeVFS.
//!
//! This crate provides:
//! - A mock remote that serves resources from memory and logs every fetch
//! - A deterministic host (counting randomness, settable clock, captured logs)
//! - Fixtures for SQLite headers, database images and wired registries
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use rangevfs_testkit::prelude::*;
//!
//! let test = TestRegistry::serving("app.db", sqlite_database(1024, 2));
//! let opened = test.open_main("app.db").unwrap();
//! assert_eq!(opened.file.file_size().unwrap(), 2048);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mock;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::mock::*;
}

pub use fixtures::*;
pub use generators::*;
pub use mock::*;
