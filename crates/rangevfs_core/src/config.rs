//! Configuration for the standard backend composition.

use crate::{memory, remote, underlay};

/// Configuration for [`crate::VfsRegistry::standard`].
#[derive(Debug, Clone)]
pub struct VfsConfig {
    /// Name of the range backend (the default backend).
    pub remote_name: String,

    /// Name of the service-only underlay backend.
    pub underlay_name: String,

    /// Name of the in-memory backend used for ephemeral files.
    pub memory_name: String,

    /// Longest path name the range backend accepts.
    pub max_pathname: usize,

    /// Whether to register the memory backend for ephemeral files.
    pub register_memory: bool,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            remote_name: remote::DEFAULT_NAME.to_string(),
            underlay_name: underlay::DEFAULT_NAME.to_string(),
            memory_name: memory::DEFAULT_NAME.to_string(),
            max_pathname: remote::DEFAULT_MAX_PATHNAME,
            register_memory: true,
        }
    }
}

impl VfsConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the range backend name.
    #[must_use]
    pub fn remote_name(mut self, name: impl Into<String>) -> Self {
        self.remote_name = name.into();
        self
    }

    /// Sets the underlay backend name.
    #[must_use]
    pub fn underlay_name(mut self, name: impl Into<String>) -> Self {
        self.underlay_name = name.into();
        self
    }

    /// Sets the memory backend name.
    #[must_use]
    pub fn memory_name(mut self, name: impl Into<String>) -> Self {
        self.memory_name = name.into();
        self
    }

    /// Sets the longest accepted path name.
    #[must_use]
    pub fn max_pathname(mut self, max: usize) -> Self {
        self.max_pathname = max;
        self
    }

    /// Sets whether the memory backend is registered.
    #[must_use]
    pub fn register_memory(mut self, value: bool) -> Self {
        self.register_memory = value;
        self
    }
}
