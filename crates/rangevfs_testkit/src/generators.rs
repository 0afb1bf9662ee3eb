//! Property-based test generators using proptest.

use proptest::prelude::*;
use rangevfs_core::{AccessFlags, OpenFlags};

/// A remote file and a read window over it.
#[derive(Debug, Clone)]
pub struct ReadCase {
    /// File contents.
    pub data: Vec<u8>,
    /// Read offset. May lie past the end of the file.
    pub offset: u64,
    /// Read length.
    pub len: usize,
}

impl ReadCase {
    /// Returns the number of bytes the file can supply for this window.
    pub fn available(&self) -> usize {
        let size = self.data.len() as u64;
        if self.offset >= size {
            return 0;
        }
        (size - self.offset).min(self.len as u64) as usize
    }

    /// Returns true if the window lies entirely inside the file.
    pub fn in_bounds(&self) -> bool {
        self.offset + self.len as u64 <= self.data.len() as u64
    }
}

/// Strategy for generating file contents.
pub fn file_data_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Strategy for generating a file with a read window that may be in bounds,
/// straddle the end, or lie past it.
pub fn read_case_strategy() -> impl Strategy<Value = ReadCase> {
    file_data_strategy(4096).prop_flat_map(|data| {
        let size = data.len() as u64;
        (Just(data), 0..=size + 64, 0usize..512)
            .prop_map(|(data, offset, len)| ReadCase { data, offset, len })
    })
}

/// Strategy for generating a read window guaranteed to be in bounds.
pub fn in_bounds_read_case_strategy() -> impl Strategy<Value = ReadCase> {
    file_data_strategy(4096)
        .prop_filter("file must not be empty", |d| !d.is_empty())
        .prop_flat_map(|data| {
            let size = data.len();
            (Just(data), 0..size).prop_flat_map(move |(data, offset)| {
                (Just(data), Just(offset as u64), 0..=size - offset)
            })
        })
        .prop_map(|(data, offset, len)| ReadCase { data, offset, len })
}

/// Strategy for main-database open flags carrying write, create or
/// exclusive intent.
pub fn write_intent_flags_strategy() -> impl Strategy<Value = OpenFlags> {
    (1u32..8, any::<bool>()).prop_map(|(intent, readonly)| {
        let mut flags = OpenFlags::MAIN_DB;
        if intent & 1 != 0 {
            flags |= OpenFlags::READWRITE;
        }
        if intent & 2 != 0 {
            flags |= OpenFlags::CREATE;
        }
        if intent & 4 != 0 {
            flags |= OpenFlags::EXCLUSIVE;
        }
        if readonly {
            flags |= OpenFlags::READONLY;
        }
        flags
    })
}

/// Strategy for object kinds other than the main database.
pub fn non_main_db_kind_strategy() -> impl Strategy<Value = OpenFlags> {
    prop_oneof![
        Just(OpenFlags::TEMP_DB),
        Just(OpenFlags::TRANSIENT_DB),
        Just(OpenFlags::MAIN_JOURNAL),
        Just(OpenFlags::TEMP_JOURNAL),
        Just(OpenFlags::SUBJOURNAL),
        Just(OpenFlags::SUPER_JOURNAL),
        Just(OpenFlags::WAL),
    ]
}

/// Strategy for arbitrary access flag combinations.
pub fn access_flags_strategy() -> impl Strategy<Value = AccessFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(ro, rw, no_range)| {
        let mut flags = AccessFlags::NONE;
        if ro {
            flags |= AccessFlags::READ_ONLY;
        }
        if rw {
            flags |= AccessFlags::READ_WRITE;
        }
        if no_range {
            flags |= AccessFlags::NO_RANGE;
        }
        flags
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
