//! The pluggable file-backend contract.
//!
//! The storage engine reaches every backend through [`Vfs`] and every open
//! file through [`VfsFile`]. Each operation the engine may invoke has a
//! method; methods a backend does not care about have defaults that report
//! an explicit "unsupported" or "declined" result, never a missing entry.
//!
//! # Invariants
//!
//! - A backend declares the services it implements in [`Vfs::capabilities`]
//! - Service calls a backend does not implement are forwarded to its
//!   [`Vfs::fallback`], if any
//! - Reads never fail because the window runs past the end of the file;
//!   they report [`ReadStatus::Short`] and zero-fill the tail instead

use crate::code::ResultCode;
use crate::error::{VfsError, VfsResult};
use crate::flags::{AccessMode, Capabilities, DeviceCharacteristics, LockLevel, OpenFlags, SyncFlags};
use std::sync::Arc;

/// Message reported by the dynamic-extension error hook.
pub const DL_UNSUPPORTED_MESSAGE: &str = "Loadable extensions are not supported";

/// Outcome of a successful read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Every requested byte was read.
    Complete,
    /// The window ran past the end of the file. The first `read` bytes are
    /// valid and the rest of the buffer is zero.
    Short {
        /// Number of bytes actually read.
        read: usize,
    },
}

impl ReadStatus {
    /// Returns the status for a read of `read` bytes into a buffer of `requested` bytes.
    #[must_use]
    pub fn for_window(read: usize, requested: usize) -> Self {
        if read < requested {
            ReadStatus::Short { read }
        } else {
            ReadStatus::Complete
        }
    }

    /// Returns true for a short read.
    #[must_use]
    pub fn is_short(self) -> bool {
        matches!(self, ReadStatus::Short { .. })
    }

    /// Returns the code reported to the engine.
    #[must_use]
    pub fn code(self) -> ResultCode {
        match self {
            ReadStatus::Complete => ResultCode::Ok,
            ReadStatus::Short { .. } => ResultCode::IoErrShortRead,
        }
    }
}

/// Opaque handle returned by [`Vfs::dl_open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlHandle(pub usize);

/// Opaque symbol returned by [`Vfs::dl_sym`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlSymbol(pub usize);

/// A file opened by a backend, with the flags it reports back.
pub struct OpenedFile {
    /// Name of the backend that opened the file.
    pub backend: String,
    /// The file handle.
    pub file: Box<dyn VfsFile>,
    /// Flags reported to the caller.
    pub flags: OpenFlags,
}

impl OpenedFile {
    /// Wraps a handle opened by `backend`.
    pub fn new(backend: impl Into<String>, file: Box<dyn VfsFile>, flags: OpenFlags) -> Self {
        Self {
            backend: backend.into(),
            file,
            flags,
        }
    }
}

impl std::fmt::Debug for OpenedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedFile")
            .field("backend", &self.backend)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// An open file.
pub trait VfsFile: Send {
    /// Closes the file.
    fn close(&mut self) -> VfsResult<()>;

    /// Reads `buf.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be fetched. A window extending
    /// past the end of the file is not an error.
    fn read(&self, buf: &mut [u8], offset: u64) -> VfsResult<ReadStatus>;

    /// Writes `data` at `offset`.
    fn write(&mut self, data: &[u8], offset: u64) -> VfsResult<()>;

    /// Truncates or extends the file to `size` bytes.
    fn truncate(&mut self, size: u64) -> VfsResult<()>;

    /// Syncs the file to durable storage.
    fn sync(&mut self, flags: SyncFlags) -> VfsResult<()>;

    /// Returns the file size in bytes.
    fn file_size(&self) -> VfsResult<u64>;

    /// Raises the lock to `level`.
    fn lock(&mut self, level: LockLevel) -> VfsResult<()>;

    /// Lowers the lock to `level`.
    fn unlock(&mut self, level: LockLevel) -> VfsResult<()>;

    /// Returns true if any handle holds a reserved lock.
    fn check_reserved_lock(&self) -> VfsResult<bool>;

    /// Dispatches a file-control verb.
    fn file_control(&mut self, op: i32) -> VfsResult<()> {
        Err(VfsError::NotFound { op })
    }

    /// Returns the sector size. Zero means no preference.
    fn sector_size(&self) -> u32 {
        0
    }

    /// Returns the device characteristics.
    fn device_characteristics(&self) -> DeviceCharacteristics {
        DeviceCharacteristics::NONE
    }

    /// Returns a memory-mapped view of `[offset, offset + amount)`, or `None`
    /// to make the caller fall back to [`VfsFile::read`].
    fn fetch(&self, _offset: u64, _amount: usize) -> VfsResult<Option<&[u8]>> {
        Ok(None)
    }

    /// Releases a view returned by [`VfsFile::fetch`].
    fn unfetch(&self, _offset: u64) -> VfsResult<()> {
        Ok(())
    }
}

/// A pluggable file backend.
pub trait Vfs: Send + Sync {
    /// Returns the backend name used for registration and lookup.
    fn name(&self) -> &str;

    /// Returns the services this backend implements itself.
    fn capabilities(&self) -> Capabilities;

    /// Returns the longest path name the backend accepts.
    fn max_pathname(&self) -> usize {
        0
    }

    /// Returns the backend that answers service calls this one does not implement.
    fn fallback(&self) -> Option<&Arc<dyn Vfs>> {
        None
    }

    /// Opens `path` (or an anonymous file when `None`) with `flags`.
    fn open(&self, _path: Option<&str>, _flags: OpenFlags) -> VfsResult<OpenedFile> {
        Err(VfsError::unsupported(self.name(), "open"))
    }

    /// Deletes `path`.
    fn delete(&self, _path: &str, _sync_dir: bool) -> VfsResult<()> {
        Err(VfsError::unsupported(self.name(), "delete"))
    }

    /// Checks whether `path` is accessible in `mode`.
    fn access(&self, _path: &str, _mode: AccessMode) -> VfsResult<bool> {
        Err(VfsError::unsupported(self.name(), "access"))
    }

    /// Resolves `path` to a full path name.
    fn full_pathname(&self, _path: &str) -> VfsResult<String> {
        Err(VfsError::unsupported(self.name(), "full_pathname"))
    }

    /// Opens a loadable extension. Unsupported: always `None`.
    fn dl_open(&self, _path: &str) -> Option<DlHandle> {
        None
    }

    /// Writes the last extension-loading error into `buf`.
    fn dl_error(&self, buf: &mut [u8]) {
        write_c_message(buf, DL_UNSUPPORTED_MESSAGE);
    }

    /// Resolves a symbol of a loaded extension. Always `None`.
    fn dl_sym(&self, _handle: DlHandle, _symbol: &str) -> Option<DlSymbol> {
        None
    }

    /// Closes a loaded extension.
    fn dl_close(&self, _handle: DlHandle) {}

    /// Fills `buf` with random bytes, returning how many were written.
    fn randomness(&self, buf: &mut [u8]) -> VfsResult<usize> {
        match self.fallback() {
            Some(fallback) => fallback.randomness(buf),
            None => Err(VfsError::unsupported(self.name(), "randomness")),
        }
    }

    /// Returns the current time in Julian-day milliseconds.
    fn current_time(&self) -> VfsResult<i64> {
        match self.fallback() {
            Some(fallback) => fallback.current_time(),
            None => Err(VfsError::unsupported(self.name(), "current_time")),
        }
    }

    /// Writes the last OS error message into `buf` and returns its code.
    fn last_error(&self, buf: &mut [u8]) -> VfsResult<i32> {
        match self.fallback() {
            Some(fallback) => fallback.last_error(buf),
            None => Err(VfsError::unsupported(self.name(), "last_error")),
        }
    }
}

/// Copies `message` into `buf` as a NUL-terminated string, truncating to fit.
///
/// Returns the number of message bytes written, excluding the terminator.
/// An empty buffer is left untouched.
pub fn write_c_message(buf: &mut [u8], message: &str) -> usize {
    let Some(room) = buf.len().checked_sub(1) else {
        return 0;
    };
    let n = message.len().min(room);
    buf[..n].copy_from_slice(&message.as_bytes()[..n]);
    buf[n] = 0;
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    struct Bare;

    impl Vfs for Bare {
        fn name(&self) -> &str {
            "bare"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::default()
        }
    }

    #[test]
    fn c_message_fits() {
        let mut buf = [0xffu8; 16];
        assert_eq!(write_c_message(&mut buf, "hello"), 5);
        assert_eq!(CStr::from_bytes_until_nul(&buf).unwrap().to_str().unwrap(), "hello");
    }

    #[test]
    fn c_message_is_truncated_and_terminated() {
        let mut buf = [0xffu8; 8];
        assert_eq!(write_c_message(&mut buf, DL_UNSUPPORTED_MESSAGE), 7);
        assert_eq!(buf[7], 0);
        assert_eq!(&buf[..7], b"Loadabl");
    }

    #[test]
    fn c_message_empty_buffer() {
        let mut buf: [u8; 0] = [];
        assert_eq!(write_c_message(&mut buf, "x"), 0);

        let mut one = [0xffu8; 1];
        assert_eq!(write_c_message(&mut one, "x"), 0);
        assert_eq!(one[0], 0);
    }

    #[test]
    fn read_status_codes() {
        assert_eq!(ReadStatus::for_window(10, 10), ReadStatus::Complete);
        assert_eq!(ReadStatus::for_window(3, 10), ReadStatus::Short { read: 3 });
        assert_eq!(ReadStatus::Complete.code(), ResultCode::Ok);
        assert_eq!(ReadStatus::Short { read: 0 }.code(), ResultCode::IoErrShortRead);
    }

    #[test]
    fn bare_backend_reports_unsupported() {
        let vfs = Bare;
        assert!(matches!(
            vfs.open(Some("x"), OpenFlags::MAIN_DB),
            Err(VfsError::Unsupported { operation: "open", .. })
        ));
        assert!(vfs.delete("x", false).is_err());
        assert!(vfs.access("x", AccessMode::Exists).is_err());
        assert!(vfs.full_pathname("x").is_err());
        assert!(vfs.randomness(&mut [0u8; 4]).is_err());
        assert!(vfs.current_time().is_err());
        assert!(vfs.last_error(&mut [0u8; 4]).is_err());
    }

    #[test]
    fn dl_hooks_decline() {
        let vfs = Bare;
        assert!(vfs.dl_open("libext.so").is_none());
        assert!(vfs.dl_sym(DlHandle(1), "init").is_none());
        vfs.dl_close(DlHandle(1));

        let mut buf = [0u8; 64];
        vfs.dl_error(&mut buf);
        let msg = CStr::from_bytes_until_nul(&buf).unwrap().to_str().unwrap();
        assert_eq!(msg, DL_UNSUPPORTED_MESSAGE);
    }
}
