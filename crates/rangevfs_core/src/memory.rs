//! In-memory backend for ephemeral and scratch files.

use crate::error::{VfsError, VfsResult};
use crate::flags::{AccessMode, Capabilities, LockLevel, OpenFlags, SyncFlags};
use crate::vfs::{OpenedFile, ReadStatus, Vfs, VfsFile};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Default registration name of the memory backend.
pub const DEFAULT_NAME: &str = "memdb";

/// Default longest path name the memory backend accepts.
pub const DEFAULT_MAX_PATHNAME: usize = 1024;

/// Default size limit of a single memory file (1 GiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1 << 30;

type FileData = Arc<RwLock<Vec<u8>>>;
type FileTable = Arc<RwLock<HashMap<String, FileData>>>;

/// An in-memory backend.
///
/// This backend stores all files in memory and is suitable for:
/// - Temporary databases, journals and sub-journals
/// - Tests that need a writable backend next to the read-only one
///
/// Named files are shared between handles opened under the same name.
/// Anonymous files are private to their handle and vanish on close.
/// Service calls (randomness, clock, last error) are forwarded to the
/// fallback backend.
///
/// # Example
///
/// ```rust
/// use rangevfs_core::{MemoryVfs, OpenFlags, Vfs};
///
/// let vfs = MemoryVfs::new();
/// let flags = OpenFlags::READWRITE | OpenFlags::CREATE | OpenFlags::TEMP_JOURNAL;
/// let mut opened = vfs.open(Some("journal"), flags).unwrap();
/// opened.file.write(b"test data", 0).unwrap();
/// assert_eq!(opened.file.file_size().unwrap(), 9);
/// ```
pub struct MemoryVfs {
    name: String,
    files: FileTable,
    fallback: Option<Arc<dyn Vfs>>,
    max_pathname: usize,
    max_file_size: u64,
}

impl MemoryVfs {
    /// Creates an empty memory backend named [`DEFAULT_NAME`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            files: Arc::default(),
            fallback: None,
            max_pathname: DEFAULT_MAX_PATHNAME,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Sets the registration name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the longest path name reported to the engine.
    #[must_use]
    pub fn with_max_pathname(mut self, max_pathname: usize) -> Self {
        self.max_pathname = max_pathname;
        self
    }

    /// Sets the size limit of a single file. Writes and truncates past it
    /// fail with [`VfsError::TooLarge`].
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Sets the backend that answers service calls.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn Vfs>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Adds a named file with pre-existing data.
    ///
    /// Useful for testing.
    #[must_use]
    pub fn with_file(self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.files
            .write()
            .insert(name.into(), Arc::new(RwLock::new(data)));
        self
    }

    /// Returns a copy of a named file's contents.
    #[must_use]
    pub fn data(&self, name: &str) -> Option<Vec<u8>> {
        self.files.read().get(name).map(|data| data.read().clone())
    }

    /// Returns the names of all stored files, sorted.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs for MemoryVfs {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::OPEN
    }

    fn max_pathname(&self) -> usize {
        self.max_pathname
    }

    fn fallback(&self) -> Option<&Arc<dyn Vfs>> {
        self.fallback.as_ref()
    }

    fn open(&self, path: Option<&str>, flags: OpenFlags) -> VfsResult<OpenedFile> {
        let data = match path {
            None => FileData::default(),
            Some(path) => {
                let mut files = self.files.write();
                match files.get(path) {
                    Some(existing) => {
                        if flags.contains(OpenFlags::CREATE | OpenFlags::EXCLUSIVE) {
                            return Err(VfsError::cant_open(format!("{path} already exists")));
                        }
                        Arc::clone(existing)
                    }
                    None => {
                        if !flags.contains(OpenFlags::CREATE) {
                            return Err(VfsError::cant_open(format!("no such file: {path}")));
                        }
                        let data = FileData::default();
                        files.insert(path.to_string(), Arc::clone(&data));
                        data
                    }
                }
            }
        };

        debug!(backend = %self.name, path = path.unwrap_or("<anonymous>"), ?flags, "opened memory file");
        let file = MemoryFile {
            name: path.map(str::to_string),
            data,
            files: Arc::clone(&self.files),
            read_only: !flags.contains(OpenFlags::READWRITE),
            max_size: self.max_file_size,
            delete_on_close: flags.contains(OpenFlags::DELETEONCLOSE),
            lock: LockLevel::None,
        };
        Ok(OpenedFile::new(&self.name, Box::new(file), flags))
    }

    fn delete(&self, path: &str, _sync_dir: bool) -> VfsResult<()> {
        match self.files.write().remove(path) {
            Some(_) => Ok(()),
            None => Err(VfsError::DeleteMissing {
                path: path.to_string(),
            }),
        }
    }

    fn access(&self, path: &str, _mode: AccessMode) -> VfsResult<bool> {
        Ok(self.files.read().contains_key(path))
    }

    fn full_pathname(&self, path: &str) -> VfsResult<String> {
        Ok(path.to_string())
    }
}

/// A file held by [`MemoryVfs`].
pub struct MemoryFile {
    name: Option<String>,
    data: FileData,
    files: FileTable,
    read_only: bool,
    max_size: u64,
    delete_on_close: bool,
    lock: LockLevel,
}

impl MemoryFile {
    /// Converts a requested file size into a buffer length, enforcing the limit.
    fn checked_len(&self, requested: u64) -> VfsResult<usize> {
        let too_large = VfsError::TooLarge {
            requested,
            limit: self.max_size,
        };
        if requested > self.max_size {
            return Err(too_large);
        }
        usize::try_from(requested).map_err(|_| too_large)
    }
}

impl VfsFile for MemoryFile {
    fn close(&mut self) -> VfsResult<()> {
        if self.delete_on_close {
            if let Some(name) = &self.name {
                let mut files = self.files.write();
                if files.get(name).is_some_and(|d| Arc::ptr_eq(d, &self.data)) {
                    files.remove(name);
                }
            }
        }
        self.lock = LockLevel::None;
        Ok(())
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> VfsResult<ReadStatus> {
        let data = self.data.read();
        let size = data.len() as u64;
        let end = offset.saturating_add(buf.len() as u64).min(size);
        let available = end.saturating_sub(offset) as usize;

        if available > 0 {
            let start = offset as usize;
            buf[..available].copy_from_slice(&data[start..start + available]);
        }
        buf[available..].fill(0);
        Ok(ReadStatus::for_window(available, buf.len()))
    }

    fn write(&mut self, new_data: &[u8], offset: u64) -> VfsResult<()> {
        if self.read_only {
            return Err(VfsError::ReadOnly);
        }
        let end = offset.saturating_add(new_data.len() as u64);
        let end = self.checked_len(end)?;
        let start = end - new_data.len();

        let mut data = self.data.write();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(new_data);
        Ok(())
    }

    fn truncate(&mut self, size: u64) -> VfsResult<()> {
        if self.read_only {
            return Err(VfsError::ReadOnly);
        }
        let size = self.checked_len(size)?;
        self.data.write().resize(size, 0);
        Ok(())
    }

    fn sync(&mut self, _flags: SyncFlags) -> VfsResult<()> {
        // Nothing to make durable
        Ok(())
    }

    fn file_size(&self) -> VfsResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn lock(&mut self, level: LockLevel) -> VfsResult<()> {
        self.lock = self.lock.max(level);
        Ok(())
    }

    fn unlock(&mut self, level: LockLevel) -> VfsResult<()> {
        self.lock = self.lock.min(level);
        Ok(())
    }

    fn check_reserved_lock(&self) -> VfsResult<bool> {
        Ok(self.lock >= LockLevel::Reserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::ResultCode;

    fn rw_create() -> OpenFlags {
        OpenFlags::READWRITE | OpenFlags::CREATE | OpenFlags::TEMP_DB
    }

    #[test]
    fn memory_new_is_empty() {
        let vfs = MemoryVfs::new();
        assert!(vfs.file_names().is_empty());
        assert!(!vfs.access("x", AccessMode::Exists).unwrap());
    }

    #[test]
    fn memory_write_and_read() {
        let vfs = MemoryVfs::new();
        let mut opened = vfs.open(Some("t"), rw_create()).unwrap();

        opened.file.write(b"hello", 0).unwrap();
        opened.file.write(b" world", 5).unwrap();
        assert_eq!(opened.file.file_size().unwrap(), 11);

        let mut buf = [0u8; 5];
        assert_eq!(opened.file.read(&mut buf, 6).unwrap(), ReadStatus::Complete);
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn memory_write_past_end_zero_fills_gap() {
        let vfs = MemoryVfs::new();
        let mut opened = vfs.open(None, rw_create()).unwrap();
        opened.file.write(b"xy", 4).unwrap();

        let mut buf = [0xffu8; 6];
        opened.file.read(&mut buf, 0).unwrap();
        assert_eq!(&buf, b"\0\0\0\0xy");
    }

    #[test]
    fn memory_short_read_zero_fills_tail() {
        let vfs = MemoryVfs::new().with_file("f", b"hello".to_vec());
        let opened = vfs.open(Some("f"), OpenFlags::READONLY).unwrap();

        let mut buf = [0xffu8; 8];
        assert_eq!(opened.file.read(&mut buf, 3).unwrap(), ReadStatus::Short { read: 2 });
        assert_eq!(&buf, b"lo\0\0\0\0\0\0");

        assert_eq!(opened.file.read(&mut buf, 10).unwrap(), ReadStatus::Short { read: 0 });
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn memory_open_missing_without_create_fails() {
        let vfs = MemoryVfs::new();
        let err = vfs.open(Some("missing"), OpenFlags::READWRITE).unwrap_err();
        assert!(matches!(err, VfsError::CantOpen { .. }));
    }

    #[test]
    fn memory_exclusive_create_on_existing_fails() {
        let vfs = MemoryVfs::new().with_file("f", Vec::new());
        let flags = rw_create() | OpenFlags::EXCLUSIVE;
        assert!(vfs.open(Some("f"), flags).is_err());
    }

    #[test]
    fn memory_named_files_are_shared() {
        let vfs = MemoryVfs::new();
        let mut a = vfs.open(Some("shared"), rw_create()).unwrap();
        let b = vfs.open(Some("shared"), OpenFlags::READONLY).unwrap();

        a.file.write(b"data", 0).unwrap();
        assert_eq!(b.file.file_size().unwrap(), 4);
        assert_eq!(vfs.data("shared").unwrap(), b"data");
    }

    #[test]
    fn memory_read_only_handle_rejects_writes() {
        let vfs = MemoryVfs::new().with_file("f", b"abc".to_vec());
        let mut opened = vfs.open(Some("f"), OpenFlags::READONLY).unwrap();
        assert!(matches!(opened.file.write(b"x", 0), Err(VfsError::ReadOnly)));
        assert!(matches!(opened.file.truncate(0), Err(VfsError::ReadOnly)));
    }

    #[test]
    fn memory_truncate() {
        let vfs = MemoryVfs::new();
        let mut opened = vfs.open(Some("t"), rw_create()).unwrap();
        opened.file.write(b"hello world", 0).unwrap();

        opened.file.truncate(5).unwrap();
        assert_eq!(vfs.data("t").unwrap(), b"hello");

        opened.file.truncate(0).unwrap();
        assert_eq!(opened.file.file_size().unwrap(), 0);
    }

    #[test]
    fn memory_write_at_huge_offset_is_too_large() {
        let vfs = MemoryVfs::new();
        let mut opened = vfs.open(None, rw_create()).unwrap();

        let err = opened.file.write(b"xy", u64::MAX - 1).unwrap_err();
        assert!(matches!(err, VfsError::TooLarge { requested: u64::MAX, .. }));
        assert_eq!(err.code(), ResultCode::Full);
        assert_eq!(opened.file.file_size().unwrap(), 0);
    }

    #[test]
    fn memory_writes_and_truncates_respect_size_limit() {
        let vfs = MemoryVfs::new().with_max_file_size(16);
        let mut opened = vfs.open(Some("t"), rw_create()).unwrap();

        opened.file.write(&[1u8; 8], 8).unwrap();
        assert_eq!(opened.file.file_size().unwrap(), 16);
        assert!(matches!(
            opened.file.write(b"x", 16),
            Err(VfsError::TooLarge { requested: 17, limit: 16 })
        ));

        assert!(matches!(
            opened.file.truncate(u64::MAX),
            Err(VfsError::TooLarge { .. })
        ));
        assert!(matches!(opened.file.truncate(17), Err(VfsError::TooLarge { .. })));
        opened.file.truncate(4).unwrap();
        assert_eq!(vfs.data("t").unwrap(), vec![0u8; 4]);
    }

    #[test]
    fn memory_max_pathname_is_configurable() {
        assert_eq!(MemoryVfs::new().max_pathname(), DEFAULT_MAX_PATHNAME);
        assert_eq!(MemoryVfs::new().with_max_pathname(512).max_pathname(), 512);
    }

    #[test]
    fn memory_delete_on_close() {
        let vfs = MemoryVfs::new();
        let mut opened = vfs
            .open(Some("tmp"), rw_create() | OpenFlags::DELETEONCLOSE)
            .unwrap();
        assert!(vfs.access("tmp", AccessMode::Exists).unwrap());
        opened.file.close().unwrap();
        assert!(!vfs.access("tmp", AccessMode::Exists).unwrap());
    }

    #[test]
    fn memory_anonymous_files_are_not_listed() {
        let vfs = MemoryVfs::new();
        let mut opened = vfs.open(None, rw_create()).unwrap();
        opened.file.write(b"scratch", 0).unwrap();
        assert!(vfs.file_names().is_empty());
    }

    #[test]
    fn memory_delete() {
        let vfs = MemoryVfs::new().with_file("f", Vec::new());
        vfs.delete("f", false).unwrap();
        assert!(matches!(
            vfs.delete("f", false),
            Err(VfsError::DeleteMissing { .. })
        ));
    }

    #[test]
    fn memory_lock_levels() {
        let vfs = MemoryVfs::new();
        let mut opened = vfs.open(None, rw_create()).unwrap();
        opened.file.lock(LockLevel::Shared).unwrap();
        assert!(!opened.file.check_reserved_lock().unwrap());
        opened.file.lock(LockLevel::Reserved).unwrap();
        assert!(opened.file.check_reserved_lock().unwrap());
        opened.file.unlock(LockLevel::Shared).unwrap();
        assert!(!opened.file.check_reserved_lock().unwrap());
    }

    #[test]
    fn memory_sync_succeeds() {
        let vfs = MemoryVfs::new();
        let mut opened = vfs.open(None, rw_create()).unwrap();
        assert!(opened.file.sync(SyncFlags::NORMAL).is_ok());
    }

    #[test]
    fn memory_services_without_fallback_are_unsupported() {
        let vfs = MemoryVfs::new();
        assert!(matches!(
            vfs.current_time(),
            Err(VfsError::Unsupported { .. })
        ));
    }
}
