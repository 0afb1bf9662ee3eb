//! Boundaries to the host environment.
//!
//! The backends never talk to the network, the clock or an entropy source
//! directly. Everything goes through the two traits in this module so that
//! a transport (HTTP, local files, a mock in tests) can be swapped in.

use crate::error::TransportError;
use crate::flags::AccessFlags;
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};

/// Accessibility and size of a remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStat {
    /// Accessibility flags.
    pub access: AccessFlags,
    /// Size in bytes.
    pub size: u64,
}

impl RemoteStat {
    /// A resource that does not exist or cannot be reached.
    pub const INACCESSIBLE: RemoteStat = RemoteStat {
        access: AccessFlags::NONE,
        size: 0,
    };

    /// Creates a stat result.
    #[must_use]
    pub const fn new(access: AccessFlags, size: u64) -> Self {
        Self { access, size }
    }
}

/// A source of remote bytes addressed by offset.
///
/// Implement this trait to provide the actual transport.
pub trait RangeSource: Send + Sync {
    /// Queries accessibility and size of `path`.
    ///
    /// A resource that exists but is not accessible is reported through the
    /// returned flags. An error means the query itself could not be performed.
    fn stat(&self, path: &str) -> Result<RemoteStat, TransportError>;

    /// Fetches bytes `[start, end_inclusive]` of `path` into `out`.
    ///
    /// `out.len()` is always `end_inclusive - start + 1`. Implementations
    /// must fill all of it or fail.
    fn fetch_range(
        &self,
        path: &str,
        start: u64,
        end_inclusive: u64,
        out: &mut [u8],
    ) -> Result<(), TransportError>;
}

/// Clock, entropy and diagnostics provided by the host.
pub trait HostServices: Send + Sync {
    /// Fills `out` with cryptographically strong random bytes.
    ///
    /// Returns the number of bytes written.
    fn fill_random(&self, out: &mut [u8]) -> usize;

    /// Returns the wall clock as milliseconds since the Unix epoch.
    fn current_epoch_millis(&self) -> i64;

    /// Emits a diagnostic. Best effort: never fails and never blocks on the sink.
    fn log(&self, code: i32, message: &str);
}

/// Host services backed by the operating system.
///
/// Randomness comes from the OS entropy source, time from the system clock
/// and log messages are forwarded to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    /// Creates the system host.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HostServices for SystemHost {
    fn fill_random(&self, out: &mut [u8]) -> usize {
        rand::rngs::OsRng.fill_bytes(out);
        out.len()
    }

    fn current_epoch_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default()
    }

    fn log(&self, code: i32, message: &str) {
        if code == 0 {
            tracing::info!(target: "rangevfs::host", code, "{message}");
        } else {
            tracing::warn!(target: "rangevfs::host", code, "{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_random_fills_buffer() {
        let host = SystemHost::new();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        assert_eq!(host.fill_random(&mut a), 32);
        assert_eq!(host.fill_random(&mut b), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn system_clock_is_after_2020() {
        let host = SystemHost::new();
        // 2020-01-01T00:00:00Z
        assert!(host.current_epoch_millis() > 1_577_836_800_000);
    }

    #[test]
    fn inaccessible_stat() {
        assert!(!RemoteStat::INACCESSIBLE.access.is_usable());
        assert_eq!(RemoteStat::INACCESSIBLE.size, 0);
    }
}
