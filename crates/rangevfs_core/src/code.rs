//! Numeric result codes reported to the storage engine.
//!
//! Values follow SQLite's primary and extended result codes so a status can
//! be handed to the engine unchanged.

/// Result code for VFS operations.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Operation succeeded.
    Ok = 0,
    /// Generic error.
    Error = 1,
    /// Attempt to write a read-only file.
    ReadOnly = 8,
    /// Generic I/O error.
    IoErr = 10,
    /// Unknown file-control verb.
    NotFound = 12,
    /// The file would grow past its size limit.
    Full = 13,
    /// The file cannot be opened.
    CantOpen = 14,
    /// Library used incorrectly (bad registration).
    Misuse = 21,
    /// Remote range fetch failed.
    IoErrRead = 10 | (1 << 8),
    /// Read window extended past the end of the file.
    IoErrShortRead = 10 | (2 << 8),
    /// Write failed.
    IoErrWrite = 10 | (3 << 8),
    /// Sync failed.
    IoErrFsync = 10 | (4 << 8),
    /// Truncate failed.
    IoErrTruncate = 10 | (6 << 8),
    /// Delete failed.
    IoErrDelete = 10 | (10 << 8),
    /// Accessibility check failed.
    IoErrAccess = 10 | (13 << 8),
}

impl ResultCode {
    /// Returns true if the code indicates success.
    pub fn is_ok(self) -> bool {
        self == ResultCode::Ok
    }

    /// Returns true if the code indicates an error.
    pub fn is_err(self) -> bool {
        self != ResultCode::Ok
    }

    /// Returns the primary code (low byte) of an extended code.
    pub fn primary(self) -> ResultCode {
        ResultCode::from(i32::from(self) & 0xff)
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code as i32
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        match code {
            0 => ResultCode::Ok,
            8 => ResultCode::ReadOnly,
            10 => ResultCode::IoErr,
            12 => ResultCode::NotFound,
            13 => ResultCode::Full,
            14 => ResultCode::CantOpen,
            21 => ResultCode::Misuse,
            266 => ResultCode::IoErrRead,
            522 => ResultCode::IoErrShortRead,
            778 => ResultCode::IoErrWrite,
            1034 => ResultCode::IoErrFsync,
            1546 => ResultCode::IoErrTruncate,
            2570 => ResultCode::IoErrDelete,
            3338 => ResultCode::IoErrAccess,
            _ => ResultCode::Error,
        }
    }
}
