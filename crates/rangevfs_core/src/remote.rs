//! Read-only backend that serves page reads with ranged remote fetches.

use crate::error::{VfsError, VfsResult};
use crate::flags::{
    AccessMode, Capabilities, DeviceCharacteristics, LockLevel, OpenFlags, SyncFlags,
};
use crate::host::{HostServices, RangeSource};
use crate::time::julian_millis;
use crate::vfs::{write_c_message, OpenedFile, ReadStatus, Vfs, VfsFile};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Default registration name of the range backend.
pub const DEFAULT_NAME: &str = "http";

/// Default longest accepted path name.
pub const DEFAULT_MAX_PATHNAME: usize = 2048;

/// A read-only backend over a [`RangeSource`].
///
/// Only the main database file can be opened, and only without create,
/// exclusive or read-write intent. Each read issues exactly one ranged
/// fetch; nothing is cached between calls.
///
/// # Example
///
/// ```rust
/// use rangevfs_core::{LocalFileSource, OpenFlags, RangeVfs, SystemHost, Vfs};
/// use std::sync::Arc;
///
/// let vfs = RangeVfs::new(Arc::new(LocalFileSource::new()), Arc::new(SystemHost::new()));
/// let result = vfs.open(Some("/no/such/file.db"), OpenFlags::READONLY | OpenFlags::MAIN_DB);
/// assert!(result.is_err());
/// ```
pub struct RangeVfs {
    name: String,
    max_pathname: usize,
    source: Arc<dyn RangeSource>,
    host: Arc<dyn HostServices>,
}

impl RangeVfs {
    /// Creates a range backend named [`DEFAULT_NAME`].
    pub fn new(source: Arc<dyn RangeSource>, host: Arc<dyn HostServices>) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            max_pathname: DEFAULT_MAX_PATHNAME,
            source,
            host,
        }
    }

    /// Sets the registration name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the longest accepted path name.
    #[must_use]
    pub fn with_max_pathname(mut self, max_pathname: usize) -> Self {
        self.max_pathname = max_pathname;
        self
    }

    /// Opens `path` and returns the concrete handle.
    ///
    /// # Errors
    ///
    /// - `CantOpen` for an anonymous path, a non-main-database object, or
    ///   any create, exclusive or read-write intent
    /// - `Stat` if the remote could not be queried
    /// - `AccessDenied` if the resource is not readable or lacks range support
    pub fn open_file(&self, path: Option<&str>, flags: OpenFlags) -> VfsResult<RangeFile> {
        let result = self.try_open(path, flags);
        if let Err(err) = &result {
            warn!(backend = %self.name, path = path.unwrap_or("<anonymous>"), %err, "open failed");
            self.host.log(err.code().into(), &err.to_string());
        }
        result
    }

    fn try_open(&self, path: Option<&str>, flags: OpenFlags) -> VfsResult<RangeFile> {
        let Some(path) = path else {
            return Err(VfsError::cant_open("anonymous temp files are not supported"));
        };

        if !flags.is_main_db() {
            return Err(VfsError::cant_open(format!(
                "only the main database can be opened, got {flags:?}"
            )));
        }

        if flags.has_write_intent() {
            return Err(VfsError::cant_open(format!(
                "read-only backend refuses create/exclusive/read-write intent, got {flags:?}"
            )));
        }

        let stat = self.source.stat(path).map_err(|source| VfsError::Stat {
            path: path.to_string(),
            source,
        })?;

        if !stat.access.is_usable() {
            return Err(VfsError::AccessDenied {
                path: path.to_string(),
                access: stat.access,
            });
        }

        debug!(backend = %self.name, path, size = stat.size, "opened remote file");
        Ok(RangeFile {
            path: path.to_string(),
            size: stat.size,
            flags,
            source: Arc::clone(&self.source),
        })
    }
}

impl Vfs for RangeVfs {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn max_pathname(&self) -> usize {
        self.max_pathname
    }

    fn open(&self, path: Option<&str>, flags: OpenFlags) -> VfsResult<OpenedFile> {
        let file = self.open_file(path, flags)?;
        Ok(OpenedFile::new(&self.name, Box::new(file), flags))
    }

    fn delete(&self, path: &str, _sync_dir: bool) -> VfsResult<()> {
        Err(VfsError::DeleteUnsupported {
            path: path.to_string(),
        })
    }

    fn access(&self, path: &str, _mode: AccessMode) -> VfsResult<bool> {
        // Exists, Read and ReadWrite all ask the same question here:
        // can this backend serve the resource.
        let stat = self.source.stat(path).map_err(|source| VfsError::AccessCheck {
            path: path.to_string(),
            source,
        })?;
        Ok(stat.access.is_usable())
    }

    fn full_pathname(&self, path: &str) -> VfsResult<String> {
        Ok(path.to_string())
    }

    fn randomness(&self, buf: &mut [u8]) -> VfsResult<usize> {
        Ok(self.host.fill_random(buf))
    }

    fn current_time(&self) -> VfsResult<i64> {
        Ok(julian_millis(self.host.current_epoch_millis()))
    }

    fn last_error(&self, buf: &mut [u8]) -> VfsResult<i32> {
        write_c_message(buf, "");
        Ok(0)
    }
}

/// An open remote file.
///
/// Holds only the path and the size captured at open time. Closing
/// performs no network activity.
#[derive(Clone)]
pub struct RangeFile {
    path: String,
    size: u64,
    flags: OpenFlags,
    source: Arc<dyn RangeSource>,
}

impl RangeFile {
    /// Returns the resource identifier.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the size captured at open time.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the flags the file was opened with.
    #[must_use]
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }
}

impl std::fmt::Debug for RangeFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeFile")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl VfsFile for RangeFile {
    fn close(&mut self) -> VfsResult<()> {
        Ok(())
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> VfsResult<ReadStatus> {
        let requested = buf.len();
        let end = offset.saturating_add(requested as u64).min(self.size);
        // Zero when the offset is at or past the end.
        let available = end.saturating_sub(offset) as usize;

        if available > 0 {
            trace!(path = %self.path, start = offset, end = end - 1, "fetching range");
            if let Err(source) =
                self.source
                    .fetch_range(&self.path, offset, end - 1, &mut buf[..available])
            {
                warn!(path = %self.path, offset, len = available, %source, "range fetch failed");
                return Err(VfsError::Read {
                    path: self.path.clone(),
                    offset,
                    len: available,
                    source,
                });
            }
        }

        buf[available..].fill(0);
        Ok(ReadStatus::for_window(available, requested))
    }

    fn write(&mut self, _data: &[u8], _offset: u64) -> VfsResult<()> {
        Err(VfsError::WriteUnsupported)
    }

    fn truncate(&mut self, _size: u64) -> VfsResult<()> {
        Err(VfsError::TruncateUnsupported)
    }

    fn sync(&mut self, _flags: SyncFlags) -> VfsResult<()> {
        Err(VfsError::SyncUnsupported)
    }

    fn file_size(&self) -> VfsResult<u64> {
        Ok(self.size)
    }

    fn lock(&mut self, _level: LockLevel) -> VfsResult<()> {
        Ok(())
    }

    fn unlock(&mut self, _level: LockLevel) -> VfsResult<()> {
        Ok(())
    }

    fn check_reserved_lock(&self) -> VfsResult<bool> {
        Ok(false)
    }

    fn file_control(&mut self, op: i32) -> VfsResult<()> {
        Err(VfsError::NotFound { op })
    }

    fn sector_size(&self) -> u32 {
        0
    }

    fn device_characteristics(&self) -> DeviceCharacteristics {
        DeviceCharacteristics::NONE
    }

    fn fetch(&self, _offset: u64, _amount: usize) -> VfsResult<Option<&[u8]>> {
        Ok(None)
    }

    fn unfetch(&self, _offset: u64) -> VfsResult<()> {
        Ok(())
    }
}
