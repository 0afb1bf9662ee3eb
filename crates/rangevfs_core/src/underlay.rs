//! Service-only backend.
//!
//! The underlay owns no files. It exists so that a backend which does not
//! implement randomness, the clock or last-error reporting itself can point
//! at it as its fallback, and the engine always finds an answer.

use crate::error::VfsResult;
use crate::flags::Capabilities;
use crate::host::HostServices;
use crate::time::julian_millis;
use crate::vfs::{write_c_message, Vfs};
use std::sync::Arc;

/// Default registration name of the underlay backend.
pub const DEFAULT_NAME: &str = "underlay";

/// A backend providing only host services.
pub struct UnderlayVfs {
    name: String,
    host: Arc<dyn HostServices>,
}

impl UnderlayVfs {
    /// Creates an underlay named [`DEFAULT_NAME`] over `host`.
    pub fn new(host: Arc<dyn HostServices>) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            host,
        }
    }

    /// Sets the registration name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Vfs for UnderlayVfs {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::RANDOMNESS | Capabilities::CLOCK | Capabilities::LAST_ERROR
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
