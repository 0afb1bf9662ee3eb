//! Range source over the local file system.

use crate::error::TransportError;
use crate::flags::AccessFlags;
use crate::host::{RangeSource, RemoteStat};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A [`RangeSource`] that reads byte ranges from local files.
///
/// Paths are resolved against an optional root directory. Every fetch opens
/// the file, seeks and reads exactly the requested window, so a local file
/// behaves like a remote resource that supports range requests.
///
/// # Example
///
/// ```no_run
/// use rangevfs_core::{LocalFileSource, RangeSource};
///
/// let source = LocalFileSource::new();
/// let stat = source.stat("data/app.db").unwrap();
/// let mut header = [0u8; 100];
/// source.fetch_range("data/app.db", 0, 99, &mut header).unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalFileSource {
    root: Option<PathBuf>,
}

impl LocalFileSource {
    /// Creates a source that resolves paths as given.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that resolves paths relative to `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Returns the root directory, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        }
    }
}

impl RangeSource for LocalFileSource {
    fn stat(&self, path: &str) -> Result<RemoteStat, TransportError> {
        let metadata = match std::fs::metadata(self.resolve(path)) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(RemoteStat::INACCESSIBLE),
            Err(err) => return Err(err.into()),
        };

        if !metadata.is_file() {
            return Ok(RemoteStat::INACCESSIBLE);
        }

        let access = if metadata.permissions().readonly() {
            AccessFlags::READ_ONLY
        } else {
            AccessFlags::READ_WRITE
        };
        Ok(RemoteStat::new(access, metadata.len()))
    }

    fn fetch_range(
        &self,
        path: &str,
        start: u64,
        end_inclusive: u64,
        out: &mut [u8],
    ) -> Result<(), TransportError> {
        let expected = end_inclusive
            .checked_sub(start)
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| TransportError::new(format!("invalid range {start}-{end_inclusive}")))?;
        if expected != out.len() as u64 {
            return Err(TransportError::new(format!(
                "range {start}-{end_inclusive} does not match buffer of {} bytes",
                out.len()
            )));
        }

        let mut file = File::open(self.resolve(path))?;
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(out)?;
        Ok(())
    }
}
