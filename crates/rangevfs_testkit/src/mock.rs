//! In-process stand-ins for the remote and the host.

use parking_lot::{Mutex, RwLock};
use rangevfs_core::{AccessFlags, HostServices, RangeSource, RemoteStat, TransportError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, AtomicUsize, Ordering};

/// One recorded range fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    /// Requested path.
    pub path: String,
    /// First byte.
    pub start: u64,
    /// Last byte, inclusive.
    pub end_inclusive: u64,
}

#[derive(Debug, Clone)]
struct MockResource {
    data: Vec<u8>,
    access: AccessFlags,
}

/// A [`RangeSource`] serving resources from memory.
///
/// Every fetch is logged, and stat or fetch can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MockRemote {
    resources: RwLock<HashMap<String, MockResource>>,
    fetches: Mutex<Vec<FetchRecord>>,
    stat_calls: AtomicUsize,
    fail_stat: AtomicBool,
    fail_fetch: AtomicBool,
}

impl MockRemote {
    /// Creates a remote with no resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a read-only resource that supports ranges.
    #[must_use]
    pub fn with_resource(self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data, AccessFlags::READ_ONLY);
        self
    }

    /// Adds a resource with explicit access flags.
    #[must_use]
    pub fn with_access(
        self,
        path: impl Into<String>,
        data: impl Into<Vec<u8>>,
        access: AccessFlags,
    ) -> Self {
        self.insert(path, data, access);
        self
    }

    /// Adds or replaces a resource.
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Vec<u8>>, access: AccessFlags) {
        self.resources.write().insert(
            path.into(),
            MockResource {
                data: data.into(),
                access,
            },
        );
    }

    /// Removes a resource.
    pub fn remove(&self, path: &str) -> bool {
        self.resources.write().remove(path).is_some()
    }

    /// Makes every stat fail with a transport error.
    pub fn set_fail_stat(&self, fail: bool) {
        self.fail_stat.store(fail, Ordering::SeqCst);
    }

    /// Makes every fetch fail with a transport error.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Returns all recorded fetches.
    pub fn fetches(&self) -> Vec<FetchRecord> {
        self.fetches.lock().clone()
    }

    /// Returns the number of recorded fetches.
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }

    /// Returns the number of stat calls.
    pub fn stat_count(&self) -> usize {
        self.stat_calls.load(Ordering::SeqCst)
    }

    /// Clears the fetch log and stat counter.
    pub fn clear_log(&self) {
        self.fetches.lock().clear();
        self.stat_calls.store(0, Ordering::SeqCst);
    }
}

impl RangeSource for MockRemote {
    fn stat(&self, path: &str) -> Result<RemoteStat, TransportError> {
        self.stat_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stat.load(Ordering::SeqCst) {
            return Err(TransportError::new(format!("stat of {path} failed")));
        }
        Ok(match self.resources.read().get(path) {
            Some(resource) => RemoteStat::new(resource.access, resource.data.len() as u64),
            None => RemoteStat::INACCESSIBLE,
        })
    }

    fn fetch_range(
        &self,
        path: &str,
        start: u64,
        end_inclusive: u64,
        out: &mut [u8],
    ) -> Result<(), TransportError> {
        self.fetches.lock().push(FetchRecord {
            path: path.to_string(),
            start,
            end_inclusive,
        });
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(TransportError::new(format!("fetch of {path} failed")));
        }

        let resources = self.resources.read();
        let resource = resources
            .get(path)
            .ok_or_else(|| TransportError::new(format!("{path} not found")))?;

        let start_idx = start as usize;
        let end_idx = end_inclusive as usize + 1;
        if end_idx > resource.data.len() || start_idx >= end_idx {
            return Err(TransportError::new(format!(
                "range {start}-{end_inclusive} outside {} bytes",
                resource.data.len()
            )));
        }
        if out.len() != end_idx - start_idx {
            return Err(TransportError::new("buffer does not match range"));
        }

        out.copy_from_slice(&resource.data[start_idx..end_idx]);
        Ok(())
    }
}

/// Deterministic [`HostServices`].
///
/// Random bytes count up from a seed, the clock is settable and log
/// messages are captured.
#[derive(Debug, Default)]
pub struct MockHost {
    next_byte: AtomicU8,
    epoch_millis: AtomicI64,
    logs: Mutex<Vec<(i32, String)>>,
}

impl MockHost {
    /// Creates a host with the clock at the Unix epoch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the clock.
    pub fn set_epoch_millis(&self, millis: i64) {
        self.epoch_millis.store(millis, Ordering::SeqCst);
    }

    /// Returns captured log messages.
    pub fn logs(&self) -> Vec<(i32, String)> {
        self.logs.lock().clone()
    }
}

impl HostServices for MockHost {
    fn fill_random(&self, out: &mut [u8]) -> usize {
        for byte in out.iter_mut() {
            *byte = self.next_byte.fetch_add(1, Ordering::SeqCst);
        }
        out.len()
    }

    fn current_epoch_millis(&self) -> i64 {
        self.epoch_millis.load(Ordering::SeqCst)
    }

    fn log(&self, code: i32, message: &str) {
        self.logs.lock().push((code, message.to_string()));
    }
}
