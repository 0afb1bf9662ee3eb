//! Error types for the engine binding.

use rangevfs_core::VfsError;
use rangevfs_http::HttpError;
use thiserror::Error;

/// Result type for engine operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Errors that can occur while binding the registry or running queries.
#[derive(Error, Debug)]
pub enum SqliteError {
    /// The registry could not be built or does not resolve every service.
    #[error("backend error: {0}")]
    Vfs(#[from] VfsError),

    /// The HTTP transport could not be set up.
    #[error("transport error: {0}")]
    Http(#[from] HttpError),

    /// The engine refused to register the backend set.
    #[error("engine rejected backend {name} (code {code})")]
    Register {
        /// Name the backend set was registered under.
        name: String,
        /// Engine result code.
        code: i32,
    },

    /// The database could not be opened.
    #[error("cannot open {target}: {source}")]
    Open {
        /// URL or path of the database.
        target: String,
        /// Engine error.
        #[source]
        source: rusqlite::Error,
    },

    /// Preparing or stepping a statement failed.
    #[error("engine error: {0}")]
    Engine(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangevfs_core::Service;

    #[test]
    fn error_display() {
        let err = SqliteError::Register {
            name: "http-1".into(),
            code: 21,
        };
        assert_eq!(err.to_string(), "engine rejected backend http-1 (code 21)");

        let err = SqliteError::from(VfsError::NoProvider {
            service: Service::Open,
        });
        assert_eq!(err.to_string(), "backend error: no backend provides open");
    }

    #[test]
    fn open_error_keeps_engine_source() {
        use std::error::Error as _;

        let err = SqliteError::Open {
            target: "https://example.com/app.db".into(),
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(err.to_string().starts_with("cannot open https://example.com/app.db"));
        assert!(err.source().is_some());
    }
}
