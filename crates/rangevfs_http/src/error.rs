//! Error types for the HTTP transport.

use rangevfs_core::TransportError;
use thiserror::Error;

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors that can occur while talking to an HTTP server.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The request could not be sent or the response not received.
    #[error("request to {url} failed: {message}")]
    Request {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The server answered with an unexpected status.
    #[error("{url} returned status {status}, expected {expected}")]
    Status {
        /// Requested URL.
        url: String,
        /// Received status.
        status: u16,
        /// Expected status.
        expected: u16,
    },

    /// A required header was missing or malformed.
    #[error("{url} returned invalid {header} header: {value:?}")]
    Header {
        /// Requested URL.
        url: String,
        /// Header name.
        header: &'static str,
        /// Raw value, if present.
        value: Option<String>,
    },

    /// The body length did not match the requested range.
    #[error("{url} returned {actual} bytes for a {expected}-byte range")]
    BodyLength {
        /// Requested URL.
        url: String,
        /// Expected number of bytes.
        expected: usize,
        /// Received number of bytes.
        actual: usize,
    },
}

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        TransportError::new(err.to_string())
    }
}
