//! # RangeVFS HTTP
//!
//! HTTP transport for RangeVFS.
//!
//! This crate provides:
//! - [`HttpSource`], a [`rangevfs_core::RangeSource`] that maps `stat` to
//!   `HEAD` and `fetch_range` to a `Range: bytes=a-b` `GET`
//! - [`HttpClient`], the seam between the source and an HTTP library
//! - [`ReqwestClient`], a blocking client backed by `reqwest`
//!
//! ## Example
//!
//! ```no_run
//! use rangevfs_core::{SystemHost, VfsConfig, VfsRegistry};
//! use rangevfs_http::{HttpConfig, HttpSource, ReqwestClient};
//! use std::sync::Arc;
//!
//! let config = HttpConfig::default();
//! let client = ReqwestClient::new(&config).unwrap();
//! let source = HttpSource::with_config(client, config);
//! let registry = VfsRegistry::standard(
//!     &VfsConfig::default(),
//!     Arc::new(source),
//!     Arc::new(SystemHost::new()),
//! )
//! .unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod source;

pub use client::{HttpClient, HttpResponse, ReqwestClient};
pub use config::{HttpConfig, DEFAULT_USER_AGENT};
pub use error::{HttpError, HttpResult};
pub use source::{HttpSource, STATUS_OK, STATUS_PARTIAL_CONTENT};
