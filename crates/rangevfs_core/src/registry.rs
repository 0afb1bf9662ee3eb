//! Backend registry, service resolution and open routing.
//!
//! The registry is an ordinary owned value: build it once (usually with
//! [`VfsRegistry::standard`]), then hand shared references to whatever
//! performs opens. Nothing here is global.
//!
//! ## Composition
//!
//! The standard composition registers, in order:
//!
//! 1. the underlay (services only, never default)
//! 2. the memory backend (ephemeral files, falls back to the underlay)
//! 3. the range backend (main database, default)
//!
//! Every service call resolves to exactly one backend: the default backend
//! if it implements the service, otherwise the first backend along its
//! fallback chain that does.

use crate::config::VfsConfig;
use crate::error::{VfsError, VfsResult};
use crate::flags::{OpenFlags, Service};
use crate::host::{HostServices, RangeSource};
use crate::memory::MemoryVfs;
use crate::remote::RangeVfs;
use crate::underlay::UnderlayVfs;
use crate::vfs::{OpenedFile, Vfs};
use std::sync::Arc;
use tracing::{debug, warn};

/// One step of an initialization sequence.
pub struct Registration {
    vfs: Arc<dyn Vfs>,
    make_default: bool,
    ephemeral: bool,
}

impl Registration {
    /// Registers `vfs` without making it default.
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            make_default: false,
            ephemeral: false,
        }
    }

    /// Makes the backend the default.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.make_default = true;
        self
    }

    /// Routes ephemeral opens to the backend.
    #[must_use]
    pub fn as_ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

/// The set of registered backends.
#[derive(Default)]
pub struct VfsRegistry {
    entries: Vec<Arc<dyn Vfs>>,
    default: Option<String>,
    ephemeral: Option<String>,
}

impl VfsRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry by applying `registrations` in order.
    ///
    /// Stops at the first failing step and returns its error unchanged; no
    /// partially initialized registry escapes. The finished registry is
    /// validated with [`VfsRegistry::validate`].
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing registration, or the
    /// validation error.
    pub fn initialize(registrations: impl IntoIterator<Item = Registration>) -> VfsResult<Self> {
        let mut registry = Self::new();
        for (step, registration) in registrations.into_iter().enumerate() {
            let name = registration.vfs.name().to_string();
            if let Err(err) = registry.apply(registration) {
                warn!(step, backend = %name, %err, "backend initialization aborted");
                return Err(err);
            }
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Builds the standard composition: underlay, memory (ephemeral), range
    /// backend (default).
    ///
    /// # Errors
    ///
    /// Returns an error if any registration fails.
    pub fn standard(
        config: &VfsConfig,
        source: Arc<dyn RangeSource>,
        host: Arc<dyn HostServices>,
    ) -> VfsResult<Self> {
        let underlay: Arc<dyn Vfs> =
            Arc::new(UnderlayVfs::new(Arc::clone(&host)).with_name(&config.underlay_name));

        let mut steps = vec![Registration::new(Arc::clone(&underlay))];
        if config.register_memory {
            let memory = MemoryVfs::new()
                .with_name(&config.memory_name)
                .with_max_pathname(config.max_pathname)
                .with_fallback(Arc::clone(&underlay));
            steps.push(Registration::new(Arc::new(memory)).as_ephemeral());
        }
        let remote = RangeVfs::new(source, host)
            .with_name(&config.remote_name)
            .with_max_pathname(config.max_pathname);
        steps.push(Registration::new(Arc::new(remote)).as_default());

        Self::initialize(steps)
    }

    fn apply(&mut self, registration: Registration) -> VfsResult<()> {
        let name = registration.vfs.name().to_string();
        let supports_open = registration
            .vfs
            .capabilities()
            .provides(Service::Open);
        self.register(registration.vfs, registration.make_default)?;
        if registration.ephemeral {
            if !supports_open {
                return Err(VfsError::Registration {
                    backend: name,
                    reason: "ephemeral backend must implement open".into(),
                });
            }
            self.ephemeral = Some(name);
        }
        Ok(())
    }

    /// Registers a backend, optionally making it the default.
    ///
    /// Registering a name that already exists replaces that backend in place,
    /// unless another backend falls back to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, if the backend falls back to a
    /// backend that is not registered yet, or if it would replace a backend
    /// that others fall back to.
    pub fn register(&mut self, vfs: Arc<dyn Vfs>, make_default: bool) -> VfsResult<()> {
        let name = vfs.name().to_string();
        if name.is_empty() {
            return Err(VfsError::Registration {
                backend: name,
                reason: "name must not be empty".into(),
            });
        }

        if let Some(fallback) = vfs.fallback() {
            if fallback.name() == name {
                return Err(VfsError::Registration {
                    backend: name,
                    reason: "backend cannot fall back to itself".into(),
                });
            }
            if self.position(fallback.name()).is_none() {
                return Err(VfsError::MissingPrerequisite {
                    backend: name,
                    prerequisite: fallback.name().to_string(),
                });
            }
        }

        match self.position(&name) {
            Some(index) => {
                if let Some(dependent) = self.dependent_of(&name) {
                    return Err(VfsError::Registration {
                        backend: name,
                        reason: format!("cannot replace, {dependent} still falls back to it"),
                    });
                }
                self.entries[index] = vfs;
            }
            None => self.entries.push(vfs),
        }
        if make_default {
            self.default = Some(name.clone());
        }
        debug!(backend = %name, make_default, "registered backend");
        Ok(())
    }

    /// Removes a backend. Returns false if it was not registered.
    ///
    /// # Errors
    ///
    /// Returns an error if another registered backend falls back to it.
    pub fn unregister(&mut self, name: &str) -> VfsResult<bool> {
        let Some(index) = self.position(name) else {
            return Ok(false);
        };

        if let Some(dependent) = self.dependent_of(name) {
            return Err(VfsError::Registration {
                backend: name.to_string(),
                reason: format!("{dependent} still falls back to it"),
            });
        }

        self.entries.remove(index);
        if self.default.as_deref() == Some(name) {
            self.default = None;
        }
        if self.ephemeral.as_deref() == Some(name) {
            self.ephemeral = None;
        }
        debug!(backend = %name, "unregistered backend");
        Ok(true)
    }

    /// Routes ephemeral opens to the named backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not registered or cannot open files.
    pub fn set_ephemeral(&mut self, name: &str) -> VfsResult<()> {
        let vfs = self.find(Some(name)).ok_or_else(|| VfsError::Registration {
            backend: name.to_string(),
            reason: "not registered".into(),
        })?;
        if !vfs.capabilities().provides(Service::Open) {
            return Err(VfsError::Registration {
                backend: name.to_string(),
                reason: "ephemeral backend must implement open".into(),
            });
        }
        self.ephemeral = Some(name.to_string());
        Ok(())
    }

    /// Finds a backend by name, or the default backend when `name` is `None`.
    #[must_use]
    pub fn find(&self, name: Option<&str>) -> Option<Arc<dyn Vfs>> {
        let name = match name {
            Some(name) => name,
            None => self.default.as_deref()?,
        };
        self.position(name).map(|index| Arc::clone(&self.entries[index]))
    }

    /// Returns the default backend.
    #[must_use]
    pub fn default_vfs(&self) -> Option<Arc<dyn Vfs>> {
        self.find(None)
    }

    /// Returns the default backend's name.
    #[must_use]
    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Returns the backend that receives ephemeral opens.
    #[must_use]
    pub fn ephemeral_vfs(&self) -> Option<Arc<dyn Vfs>> {
        self.ephemeral.as_deref().and_then(|name| self.find(Some(name)))
    }

    /// Returns backend names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|vfs| vfs.name()).collect()
    }

    /// Returns the number of registered backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no backend is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the one backend that answers `service`.
    ///
    /// # Errors
    ///
    /// Returns `NoProvider` if there is no default backend or neither it
    /// nor its fallback chain implements the service.
    pub fn resolve(&self, service: Service) -> VfsResult<Arc<dyn Vfs>> {
        let mut current = self.default_vfs().ok_or(VfsError::NoProvider { service })?;
        loop {
            if current.capabilities().provides(service) {
                return Ok(current);
            }
            let next = match current.fallback() {
                Some(fallback) => Arc::clone(fallback),
                None => return Err(VfsError::NoProvider { service }),
            };
            current = next;
        }
    }

    /// Checks that every service resolves.
    ///
    /// # Errors
    ///
    /// Returns the first service without a provider.
    pub fn validate(&self) -> VfsResult<()> {
        for service in Service::ALL {
            self.resolve(service)?;
        }
        Ok(())
    }

    /// Opens a file, routing by object kind.
    ///
    /// A named main database goes to the backend resolving [`Service::Open`];
    /// anything else (anonymous files, journals, temp databases) goes to the
    /// ephemeral backend, or the default one if none is designated.
    ///
    /// # Errors
    ///
    /// Returns the backend's open error unchanged.
    pub fn open(&self, path: Option<&str>, flags: OpenFlags) -> VfsResult<OpenedFile> {
        let vfs = if flags.is_main_db() && path.is_some() {
            self.resolve(Service::Open)?
        } else {
            match self.ephemeral_vfs() {
                Some(vfs) => vfs,
                None => self.resolve(Service::Open)?,
            }
        };
        debug!(backend = vfs.name(), path = path.unwrap_or("<anonymous>"), ?flags, "routing open");
        vfs.open(path, flags)
    }

    /// Fills `buf` with random bytes from the resolved provider.
    ///
    /// # Errors
    ///
    /// Returns an error if no backend provides randomness.
    pub fn randomness(&self, buf: &mut [u8]) -> VfsResult<usize> {
        self.resolve(Service::Randomness)?.randomness(buf)
    }

    /// Returns the current time in Julian-day milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if no backend provides a clock.
    pub fn current_time(&self) -> VfsResult<i64> {
        self.resolve(Service::Clock)?.current_time()
    }

    /// Writes the last error message into `buf` and returns its code.
    ///
    /// # Errors
    ///
    /// Returns an error if no backend provides last-error reporting.
    pub fn last_error(&self, buf: &mut [u8]) -> VfsResult<i32> {
        self.resolve(Service::LastError)?.last_error(buf)
    }

    /// Tears the registry down. Backends hold no resources, so this only
    /// consumes the registry.
    ///
    /// # Errors
    ///
    /// Never fails; the result mirrors the engine's shutdown hook.
    pub fn shutdown(self) -> VfsResult<()> {
        debug!(backends = self.entries.len(), "registry shut down");
        Ok(())
    }

    fn dependent_of(&self, name: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|vfs| vfs.fallback().is_some_and(|fb| fb.name() == name))
            .map(|vfs| vfs.name().to_string())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|vfs| vfs.name() == name)
    }
}

impl std::fmt::Debug for VfsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VfsRegistry")
            .field("backends", &self.names())
            .field("default", &self.default)
            .field("ephemeral", &self.ephemeral)
            .finish()
    }
}
