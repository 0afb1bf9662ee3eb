//! Test fixtures and registry helpers.

use crate::mock::{MockHost, MockRemote};
use rangevfs_core::{OpenFlags, OpenedFile, VfsConfig, VfsRegistry, VfsResult};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Size of the SQLite database header.
pub const SQLITE_HEADER_SIZE: usize = 100;

/// Flags the engine uses to open a read-only main database.
pub fn main_db_flags() -> OpenFlags {
    OpenFlags::READONLY | OpenFlags::MAIN_DB
}

/// Flags the engine uses to create a rollback journal.
pub fn journal_flags() -> OpenFlags {
    OpenFlags::READWRITE | OpenFlags::CREATE | OpenFlags::MAIN_JOURNAL
}

/// Returns `len` bytes of a non-repeating-looking pattern.
///
/// Byte `i` is `(i * 31 + 7) % 251`, so any window identifies its offset.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + 7) % 251) as u8).collect()
}

/// Builds a 100-byte SQLite header for the given geometry.
pub fn sqlite_header(page_size: u32, page_count: u32) -> [u8; SQLITE_HEADER_SIZE] {
    let mut h = [0u8; SQLITE_HEADER_SIZE];
    h[..16].copy_from_slice(b"SQLite format 3\0");
    let raw_page_size: u16 = if page_size == 65_536 { 1 } else { page_size as u16 };
    h[16..18].copy_from_slice(&raw_page_size.to_be_bytes());
    h[18] = 1;
    h[19] = 1;
    h[21] = 64;
    h[22] = 32;
    h[23] = 32;
    h[24..28].copy_from_slice(&1u32.to_be_bytes());
    h[28..32].copy_from_slice(&page_count.to_be_bytes());
    h[40..44].copy_from_slice(&1u32.to_be_bytes());
    h[44..48].copy_from_slice(&4u32.to_be_bytes());
    h[56..60].copy_from_slice(&1u32.to_be_bytes());
    h[92..96].copy_from_slice(&1u32.to_be_bytes());
    h[96..100].copy_from_slice(&3_045_000u32.to_be_bytes());
    h
}

/// Builds a database image: the header followed by patterned page bytes.
pub fn sqlite_database(page_size: u32, page_count: u32) -> Vec<u8> {
    let mut data = patterned(page_size as usize * page_count as usize);
    if data.len() >= SQLITE_HEADER_SIZE {
        data[..SQLITE_HEADER_SIZE].copy_from_slice(&sqlite_header(page_size, page_count));
    }
    data
}

/// Writes `data` to a file in a fresh temporary directory.
///
/// The directory is removed when the returned [`TempDir`] is dropped.
pub fn write_temp_file(name: &str, data: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join(name);
    std::fs::write(&path, data).expect("Failed to write fixture");
    (dir, path)
}

/// A standard registry wired to a [`MockRemote`] and a [`MockHost`].
pub struct TestRegistry {
    /// The registry.
    pub registry: VfsRegistry,
    /// The remote behind the range backend.
    pub remote: Arc<MockRemote>,
    /// The host behind every backend.
    pub host: Arc<MockHost>,
}

impl TestRegistry {
    /// Builds the standard composition over `remote`.
    pub fn new(remote: MockRemote) -> Self {
        Self::with_config(remote, &VfsConfig::default())
    }

    /// Builds the standard composition over `remote` with `config`.
    pub fn with_config(remote: MockRemote, config: &VfsConfig) -> Self {
        let remote = Arc::new(remote);
        let host = Arc::new(MockHost::new());
        let registry = VfsRegistry::standard(config, remote.clone(), host.clone())
            .expect("Failed to build registry");
        Self {
            registry,
            remote,
            host,
        }
    }

    /// Serves a single database at `path`.
    pub fn serving(path: &str, data: Vec<u8>) -> Self {
        Self::new(MockRemote::new().with_resource(path, data))
    }

    /// Opens `path` as a read-only main database.
    pub fn open_main(&self, path: &str) -> VfsResult<OpenedFile> {
        self.registry.open(Some(path), main_db_flags())
    }
}

impl std::ops::Deref for TestRegistry {
    type Target = VfsRegistry;

    fn deref(&self) -> &Self::Target {
        &self.registry
    }
}
