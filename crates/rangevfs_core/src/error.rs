//! Error types for VFS operations.

use crate::code::ResultCode;
use crate::flags::{AccessFlags, Service};
use thiserror::Error;

/// Result type for VFS operations.
pub type VfsResult<T> = Result<T, VfsError>;

/// Failure reported by a range source or other host boundary.
///
/// The transport itself is opaque to this crate; only its message survives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates a transport error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors that can occur during VFS operations.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The open request has an invalid shape for this backend.
    #[error("cannot open: {reason}")]
    CantOpen {
        /// Why the request was refused.
        reason: String,
    },

    /// The remote stat query could not be performed during open.
    #[error("stat failed for {path}: {source}")]
    Stat {
        /// Resource identifier.
        path: String,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The resource is not readable or cannot serve ranged fetches.
    #[error("access denied for {path} ({access})")]
    AccessDenied {
        /// Resource identifier.
        path: String,
        /// Flags reported by the remote.
        access: AccessFlags,
    },

    /// The accessibility query itself failed.
    #[error("access check failed for {path}: {source}")]
    AccessCheck {
        /// Resource identifier.
        path: String,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// A ranged fetch failed.
    #[error("read failed for {path} at offset {offset}, len {len}: {source}")]
    Read {
        /// Resource identifier.
        path: String,
        /// Requested offset.
        offset: u64,
        /// Number of in-bounds bytes requested.
        len: usize,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// Writing is not supported.
    #[error("write not supported")]
    WriteUnsupported,

    /// Truncating is not supported.
    #[error("truncate not supported")]
    TruncateUnsupported,

    /// Syncing is not supported.
    #[error("sync not supported")]
    SyncUnsupported,

    /// Deleting is not supported.
    #[error("delete not supported for {path}")]
    DeleteUnsupported {
        /// Resource identifier.
        path: String,
    },

    /// The file to delete does not exist.
    #[error("no such file: {path}")]
    DeleteMissing {
        /// File name.
        path: String,
    },

    /// A write or truncate would take the file past its size limit.
    #[error("file would grow to {requested} bytes, limit is {limit}")]
    TooLarge {
        /// Size the operation asked for. Saturates at `u64::MAX`.
        requested: u64,
        /// Largest size the backend accepts.
        limit: u64,
    },

    /// The handle was opened read-only.
    #[error("file is read-only")]
    ReadOnly,

    /// Unknown file-control verb.
    #[error("file control {op} not found")]
    NotFound {
        /// The verb.
        op: i32,
    },

    /// The backend does not implement this operation.
    #[error("{backend}: {operation} not supported")]
    Unsupported {
        /// Backend name.
        backend: String,
        /// Operation name.
        operation: &'static str,
    },

    /// No registered backend answers a service call.
    #[error("no backend provides {service}")]
    NoProvider {
        /// The service.
        service: Service,
    },

    /// A backend registration was rejected.
    #[error("cannot register backend {backend}: {reason}")]
    Registration {
        /// Backend name.
        backend: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A backend was registered before the backend it depends on.
    #[error("backend {backend} depends on {prerequisite}, which is not registered")]
    MissingPrerequisite {
        /// Backend being registered.
        backend: String,
        /// Backend it falls back to.
        prerequisite: String,
    },
}

impl VfsError {
    /// Creates a cannot-open error.
    pub fn cant_open(reason: impl Into<String>) -> Self {
        Self::CantOpen {
            reason: reason.into(),
        }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(backend: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            backend: backend.into(),
            operation,
        }
    }

    /// Returns the result code reported to the storage engine.
    pub fn code(&self) -> ResultCode {
        match self {
            VfsError::CantOpen { .. } => ResultCode::CantOpen,
            VfsError::Stat { .. } => ResultCode::IoErr,
            VfsError::AccessDenied { .. } | VfsError::AccessCheck { .. } => ResultCode::IoErrAccess,
            VfsError::Read { .. } => ResultCode::IoErrRead,
            VfsError::WriteUnsupported => ResultCode::IoErrWrite,
            VfsError::TruncateUnsupported => ResultCode::IoErrTruncate,
            VfsError::SyncUnsupported => ResultCode::IoErrFsync,
            VfsError::DeleteUnsupported { .. } | VfsError::DeleteMissing { .. } => {
                ResultCode::IoErrDelete
            }
            VfsError::TooLarge { .. } => ResultCode::Full,
            VfsError::ReadOnly => ResultCode::ReadOnly,
            VfsError::NotFound { .. } => ResultCode::NotFound,
            VfsError::Unsupported { .. } | VfsError::NoProvider { .. } => ResultCode::Error,
            VfsError::Registration { .. } | VfsError::MissingPrerequisite { .. } => {
                ResultCode::Misuse
            }
        }
    }
}
