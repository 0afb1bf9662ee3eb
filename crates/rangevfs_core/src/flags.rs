//! Flag sets and small enums shared by every backend.
//!
//! Bit values for [`OpenFlags`], [`AccessMode`], [`LockLevel`] and
//! [`SyncFlags`] match the storage engine's own constants.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

macro_rules! bitset {
    ($(#[$meta:meta])* $name:ident($repr:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name($repr);

        impl $name {
            /// Creates a set from raw bits. Unknown bits are kept.
            #[must_use]
            pub const fn from_bits(bits: $repr) -> Self {
                Self(bits)
            }

            /// Returns the raw bits.
            #[must_use]
            pub const fn bits(self) -> $repr {
                self.0
            }

            /// Returns true if every bit of `other` is set.
            #[must_use]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Returns true if any bit of `other` is set.
            #[must_use]
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            /// Returns true if no bit is set.
            #[must_use]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Returns the union of both sets.
            #[must_use]
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            /// Returns this set without the bits of `other`.
            #[must_use]
            pub const fn difference(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0)
            }
        }
    };
}

bitset! {
    /// Flags passed to `open` describing the object kind and intent.
    OpenFlags(u32)
}

impl OpenFlags {
    /// Open for reading only.
    pub const READONLY: Self = Self(0x0000_0001);
    /// Open for reading and writing.
    pub const READWRITE: Self = Self(0x0000_0002);
    /// Create the file if it does not exist.
    pub const CREATE: Self = Self(0x0000_0004);
    /// Delete the file when the handle is closed.
    pub const DELETEONCLOSE: Self = Self(0x0000_0008);
    /// Fail if the file already exists (with `CREATE`).
    pub const EXCLUSIVE: Self = Self(0x0000_0010);
    /// The name was given as a URI.
    pub const URI: Self = Self(0x0000_0040);
    /// In-memory database.
    pub const MEMORY: Self = Self(0x0000_0080);
    /// The main database file.
    pub const MAIN_DB: Self = Self(0x0000_0100);
    /// A temporary database.
    pub const TEMP_DB: Self = Self(0x0000_0200);
    /// A transient database.
    pub const TRANSIENT_DB: Self = Self(0x0000_0400);
    /// The main rollback journal.
    pub const MAIN_JOURNAL: Self = Self(0x0000_0800);
    /// A temporary journal.
    pub const TEMP_JOURNAL: Self = Self(0x0000_1000);
    /// A sub-journal.
    pub const SUBJOURNAL: Self = Self(0x0000_2000);
    /// A super-journal.
    pub const SUPER_JOURNAL: Self = Self(0x0000_4000);
    /// A write-ahead log.
    pub const WAL: Self = Self(0x0008_0000);

    /// Bits signalling any intent to create, modify or exclusively hold a file.
    pub const WRITE_INTENT: Self = Self(Self::READWRITE.0 | Self::CREATE.0 | Self::EXCLUSIVE.0);

    /// Returns true if the request targets the main database file.
    #[must_use]
    pub const fn is_main_db(self) -> bool {
        self.contains(Self::MAIN_DB)
    }

    /// Returns true if the request carries create, exclusive or read-write intent.
    #[must_use]
    pub const fn has_write_intent(self) -> bool {
        self.intersects(Self::WRITE_INTENT)
    }
}

bitset! {
    /// Accessibility of a remote resource as reported by `stat`.
    ///
    /// A resource is usable only if it is readable and supports ranged
    /// fetches. `READ_WRITE` is informational and never permits writes.
    AccessFlags(u8)
}

impl AccessFlags {
    /// Not accessible.
    pub const NONE: Self = Self(0x00);
    /// Readable.
    pub const READ_ONLY: Self = Self(0x01);
    /// Readable and writable.
    pub const READ_WRITE: Self = Self(0x02);
    /// The resource cannot serve ranged fetches.
    pub const NO_RANGE: Self = Self(0x10);

    /// Returns true if the resource can be read at all.
    #[must_use]
    pub const fn is_readable(self) -> bool {
        self.intersects(Self::READ_ONLY.union(Self::READ_WRITE))
    }

    /// Returns true if the resource supports ranged fetches.
    #[must_use]
    pub const fn supports_ranges(self) -> bool {
        !self.contains(Self::NO_RANGE)
    }

    /// Returns true if the range backend can serve this resource.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        self.is_readable() && self.supports_ranges()
    }
}

impl fmt::Display for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = if self.contains(Self::READ_WRITE) {
            "read-write"
        } else if self.contains(Self::READ_ONLY) {
            "read-only"
        } else {
            "no-access"
        };
        if self.supports_ranges() {
            write!(f, "{base}")
        } else {
            write!(f, "{base}, no-range")
        }
    }
}

bitset! {
    /// Flags passed to `sync`.
    SyncFlags(u32)
}

impl SyncFlags {
    /// Normal sync.
    pub const NORMAL: Self = Self(0x02);
    /// Full sync.
    pub const FULL: Self = Self(0x03);
    /// Only data needs to be synced, not metadata.
    pub const DATAONLY: Self = Self(0x10);
}

bitset! {
    /// Device characteristics advertised by a file.
    DeviceCharacteristics(u32)
}

impl DeviceCharacteristics {
    /// No special characteristics.
    pub const NONE: Self = Self(0);
    /// Writes are atomic.
    pub const ATOMIC: Self = Self(0x0000_0001);
    /// Data is appended before the file size changes.
    pub const SAFE_APPEND: Self = Self(0x0000_0200);
    /// Writes happen in order.
    pub const SEQUENTIAL: Self = Self(0x0000_0400);
    /// The file never changes while open.
    pub const IMMUTABLE: Self = Self(0x0000_2000);
}

bitset! {
    /// Services a backend implements itself.
    Capabilities(u8)
}

impl Capabilities {
    /// The open family: open, delete, access, full pathname.
    pub const OPEN: Self = Self(0x01);
    /// Random byte generation.
    pub const RANDOMNESS: Self = Self(0x02);
    /// Current time.
    pub const CLOCK: Self = Self(0x04);
    /// Last-error reporting.
    pub const LAST_ERROR: Self = Self(0x08);
    /// Every service.
    pub const ALL: Self = Self(0x0f);

    /// Returns true if the set covers `service`.
    #[must_use]
    pub const fn provides(self, service: Service) -> bool {
        self.contains(service.capability())
    }
}

/// A service call the engine routes to exactly one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// open, delete, access, full pathname.
    Open,
    /// randomness.
    Randomness,
    /// current time.
    Clock,
    /// last error.
    LastError,
}

impl Service {
    /// Every service, in dispatch order.
    pub const ALL: [Service; 4] = [
        Service::Open,
        Service::Randomness,
        Service::Clock,
        Service::LastError,
    ];

    /// Returns the capability bit for this service.
    #[must_use]
    pub const fn capability(self) -> Capabilities {
        match self {
            Service::Open => Capabilities::OPEN,
            Service::Randomness => Capabilities::RANDOMNESS,
            Service::Clock => Capabilities::CLOCK,
            Service::LastError => Capabilities::LAST_ERROR,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Open => "open",
            Service::Randomness => "randomness",
            Service::Clock => "clock",
            Service::LastError => "last-error",
        };
        f.write_str(name)
    }
}

/// Mode argument of `access`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Does the file exist.
    Exists = 0,
    /// Is the file readable and writable.
    ReadWrite = 1,
    /// Is the file readable.
    Read = 2,
}

/// Lock levels, in increasing strength.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LockLevel {
    /// No lock held.
    #[default]
    None = 0,
    /// Shared (read) lock.
    Shared = 1,
    /// Reserved lock: intent to write.
    Reserved = 2,
    /// Pending lock: waiting for readers to drain.
    Pending = 3,
    /// Exclusive (write) lock.
    Exclusive = 4,
}
