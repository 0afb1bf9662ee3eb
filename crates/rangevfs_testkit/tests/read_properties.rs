//! Properties of the range backend's read and open contract.

use proptest::prelude::*;
use rangevfs_core::{
    AccessFlags, AccessMode, LockLevel, OpenFlags, ReadStatus, ResultCode, SyncFlags, Vfs,
    VfsError,
};
use rangevfs_testkit::prelude::*;
use std::sync::Arc;

const PATH: &str = "https://example.com/test.db";

fn range_vfs(remote: &Arc<MockRemote>) -> rangevfs_core::RangeVfs {
    rangevfs_core::RangeVfs::new(remote.clone(), Arc::new(MockHost::new()))
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn in_bounds_read_is_complete_and_exact(case in in_bounds_read_case_strategy()) {
        let remote = Arc::new(MockRemote::new().with_resource(PATH, case.data.clone()));
        let opened = range_vfs(&remote).open(Some(PATH), main_db_flags()).unwrap();

        let mut buf = vec![0xAAu8; case.len];
        let status = opened.file.read(&mut buf, case.offset).unwrap();

        let start = case.offset as usize;
        prop_assert_eq!(status, ReadStatus::Complete);
        prop_assert_eq!(&buf[..], &case.data[start..start + case.len]);
    }

    #[test]
    fn any_read_returns_prefix_then_zeros(case in read_case_strategy()) {
        let remote = Arc::new(MockRemote::new().with_resource(PATH, case.data.clone()));
        let opened = range_vfs(&remote).open(Some(PATH), main_db_flags()).unwrap();

        let mut buf = vec![0xAAu8; case.len];
        let status = opened.file.read(&mut buf, case.offset).unwrap();
        let available = case.available();

        if available == case.len {
            prop_assert_eq!(status, ReadStatus::Complete);
        } else {
            prop_assert_eq!(status, ReadStatus::Short { read: available });
            prop_assert_eq!(status.code(), ResultCode::IoErrShortRead);
        }

        let start = case.offset as usize;
        if available > 0 {
            prop_assert_eq!(&buf[..available], &case.data[start..start + available]);
        }
        prop_assert!(buf[available..].iter().all(|&b| b == 0));
    }

    #[test]
    fn one_fetch_per_non_empty_window(case in read_case_strategy()) {
        let remote = Arc::new(MockRemote::new().with_resource(PATH, case.data.clone()));
        let opened = range_vfs(&remote).open(Some(PATH), main_db_flags()).unwrap();

        let mut buf = vec![0u8; case.len];
        opened.file.read(&mut buf, case.offset).unwrap();

        let expected = usize::from(case.available() > 0);
        prop_assert_eq!(remote.fetch_count(), expected);
        if let Some(fetch) = remote.fetches().first() {
            prop_assert_eq!(fetch.start, case.offset);
            prop_assert_eq!(fetch.end_inclusive, case.offset + case.available() as u64 - 1);
        }
    }

    #[test]
    fn mutations_always_fail(data in file_data_strategy(256), offset in 0u64..512) {
        let remote = Arc::new(MockRemote::new().with_resource(PATH, data));
        let vfs = range_vfs(&remote);
        let mut opened = vfs.open(Some(PATH), main_db_flags()).unwrap();

        prop_assert_eq!(opened.file.write(b"x", offset).unwrap_err().code(), ResultCode::IoErrWrite);
        prop_assert_eq!(opened.file.truncate(offset).unwrap_err().code(), ResultCode::IoErrTruncate);
        prop_assert_eq!(opened.file.sync(SyncFlags::FULL).unwrap_err().code(), ResultCode::IoErrFsync);
        prop_assert_eq!(vfs.delete(PATH, false).unwrap_err().code(), ResultCode::IoErrDelete);
    }

    #[test]
    fn locks_are_noops(level in prop_oneof![
        Just(LockLevel::Shared),
        Just(LockLevel::Reserved),
        Just(LockLevel::Pending),
        Just(LockLevel::Exclusive),
    ]) {
        let remote = Arc::new(MockRemote::new().with_resource(PATH, vec![0u8; 16]));
        let mut opened = range_vfs(&remote).open(Some(PATH), main_db_flags()).unwrap();

        prop_assert!(opened.file.lock(level).is_ok());
        prop_assert!(!opened.file.check_reserved_lock().unwrap());
        prop_assert!(opened.file.unlock(LockLevel::None).is_ok());
    }

    #[test]
    fn write_intent_is_refused_before_stat(flags in write_intent_flags_strategy()) {
        let remote = Arc::new(MockRemote::new().with_resource(PATH, vec![0u8; 16]));
        let err = range_vfs(&remote).open(Some(PATH), flags).unwrap_err();

        prop_assert_eq!(err.code(), ResultCode::CantOpen);
        prop_assert_eq!(remote.stat_count(), 0);
    }

    #[test]
    fn non_main_objects_are_refused(kind in non_main_db_kind_strategy()) {
        let remote = Arc::new(MockRemote::new().with_resource(PATH, vec![0u8; 16]));
        let err = range_vfs(&remote)
            .open(Some(PATH), OpenFlags::READONLY | kind)
            .unwrap_err();
        prop_assert_eq!(err.code(), ResultCode::CantOpen);
    }

    #[test]
    fn open_and_access_agree_on_usability(access in access_flags_strategy()) {
        let remote = Arc::new(MockRemote::new().with_access(PATH, vec![0u8; 16], access));
        let vfs = range_vfs(&remote);

        let opened = vfs.open(Some(PATH), main_db_flags());
        let accessible = vfs.access(PATH, AccessMode::Read).unwrap();

        prop_assert_eq!(opened.is_ok(), access.is_usable());
        prop_assert_eq!(accessible, access.is_usable());
        if let Err(err) = opened {
            prop_assert!(matches!(err, VfsError::AccessDenied { .. }), "got {err:?}");
            prop_assert_eq!(err.code(), ResultCode::IoErrAccess);
        }
    }
}

#[test]
fn straddling_read_returns_fetched_prefix() {
    let data = patterned(100);
    let remote = Arc::new(MockRemote::new().with_resource(PATH, data.clone()));
    let opened = range_vfs(&remote).open(Some(PATH), main_db_flags()).unwrap();

    let mut buf = [0xFFu8; 20];
    let status = opened.file.read(&mut buf, 90).unwrap();

    assert_eq!(status, ReadStatus::Short { read: 10 });
    assert_eq!(&buf[..10], &data[90..]);
    assert_eq!(&buf[10..], &[0u8; 10]);
}

#[test]
fn in_bounds_read_of_fifty() {
    let data = patterned(100);
    let remote = Arc::new(MockRemote::new().with_resource(PATH, data.clone()));
    let opened = range_vfs(&remote).open(Some(PATH), main_db_flags()).unwrap();

    let mut buf = [0u8; 50];
    assert_eq!(opened.file.read(&mut buf, 0).unwrap(), ReadStatus::Complete);
    assert_eq!(&buf[..], &data[..50]);
}

#[test]
fn read_past_end_is_all_zero_without_fetch() {
    let remote = Arc::new(MockRemote::new().with_resource(PATH, patterned(100)));
    let opened = range_vfs(&remote).open(Some(PATH), main_db_flags()).unwrap();

    let mut buf = [0xFFu8; 8];
    assert_eq!(
        opened.file.read(&mut buf, 100).unwrap(),
        ReadStatus::Short { read: 0 }
    );
    assert_eq!(buf, [0u8; 8]);
    assert_eq!(remote.fetch_count(), 0);
}

#[test]
fn read_only_without_ranges_is_not_accessible() {
    let access = AccessFlags::READ_ONLY | AccessFlags::NO_RANGE;
    let remote = Arc::new(MockRemote::new().with_access(PATH, patterned(100), access));
    let vfs = range_vfs(&remote);

    assert!(!vfs.access(PATH, AccessMode::Exists).unwrap());
    assert!(matches!(
        vfs.open(Some(PATH), main_db_flags()),
        Err(VfsError::AccessDenied { .. })
    ));
}

#[test]
fn transport_failures_surface_as_errors() {
    let remote = Arc::new(MockRemote::new().with_resource(PATH, patterned(100)));
    let host = Arc::new(MockHost::new());
    let vfs = rangevfs_core::RangeVfs::new(remote.clone(), host.clone());
    let opened = vfs.open(Some(PATH), main_db_flags()).unwrap();

    remote.set_fail_fetch(true);
    let mut buf = [0u8; 10];
    let err = opened.file.read(&mut buf, 0).unwrap_err();
    assert_eq!(err.code(), ResultCode::IoErrRead);

    remote.set_fail_stat(true);
    let err = vfs.open(Some(PATH), main_db_flags()).unwrap_err();
    assert_eq!(err.code(), ResultCode::IoErr);
    assert!(host.logs().iter().any(|(code, _)| *code == 10));
}

#[test]
fn two_opens_are_independent() {
    let remote = Arc::new(MockRemote::new().with_resource(PATH, patterned(100)));
    let vfs = range_vfs(&remote);

    let mut first = vfs.open(Some(PATH), main_db_flags()).unwrap();
    let second = vfs.open(Some(PATH), main_db_flags()).unwrap();
    first.file.close().unwrap();

    let mut buf = [0u8; 4];
    assert_eq!(second.file.read(&mut buf, 0).unwrap(), ReadStatus::Complete);
    assert_eq!(second.file.file_size().unwrap(), 100);
    assert_eq!(remote.stat_count(), 2);
}
