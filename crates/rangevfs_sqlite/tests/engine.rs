//! Queries run by the real engine against databases served through a registry.

use rangevfs_core::{LocalFileSource, SystemHost, VfsConfig, VfsRegistry};
use rangevfs_sqlite::{Connection, EngineVfs, SqliteError, Value};
use rangevfs_testkit::prelude::*;
use std::path::Path;
use std::sync::Arc;

const URL: &str = "https://cdn.example.com/inventory.db";
const ITEMS: i64 = 2000;

/// Builds a multi-page database on disk and returns its bytes.
fn build_database(path: &Path) -> Vec<u8> {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch(
        "PRAGMA page_size = 1024;
         CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, weight REAL, tag BLOB);
         CREATE INDEX items_name ON items (name);",
    )
    .unwrap();
    {
        let mut insert = conn
            .prepare("INSERT INTO items (id, name, weight, tag) VALUES (?1, ?2, ?3, ?4)")
            .unwrap();
        for id in 1..=ITEMS {
            let tag = if id % 10 == 0 { None } else { Some(vec![id as u8; 4]) };
            insert
                .execute(rusqlite::params![id, format!("item-{id:03}"), id as f64 / 4.0, tag])
                .unwrap();
        }
    }
    drop(conn);
    std::fs::read(path).unwrap()
}

fn remote_fixture() -> (tempfile::TempDir, Vec<u8>, Arc<MockRemote>, Arc<EngineVfs>) {
    let dir = tempfile::tempdir().unwrap();
    let bytes = build_database(&dir.path().join("inventory.db"));
    let remote = Arc::new(MockRemote::new().with_resource(URL, bytes.clone()));
    let registry = VfsRegistry::standard(
        &VfsConfig::default(),
        remote.clone(),
        Arc::new(MockHost::new()),
    )
    .unwrap();
    let vfs = EngineVfs::register(registry).unwrap();
    (dir, bytes, remote, vfs)
}

#[test]
fn select_over_remote_database() {
    let (_dir, bytes, remote, vfs) = remote_fixture();
    let conn = Connection::open_with(URL, vfs).unwrap();

    let count = conn.query("SELECT count(*) FROM items", &[]).unwrap();
    assert_eq!(count.scalar(), Some(&Value::Integer(ITEMS)));

    let row = conn
        .query("SELECT name, weight, tag FROM items WHERE id = ?1", &[Value::Integer(42)])
        .unwrap();
    assert_eq!(row.columns, vec!["name", "weight", "tag"]);
    assert_eq!(
        row.rows,
        vec![vec![
            Value::Text("item-042".into()),
            Value::Real(10.5),
            Value::Blob(vec![42; 4]),
        ]]
    );

    // Every page came through ranged fetches inside the file.
    assert!(remote.fetch_count() > 0);
    assert!(remote.stat_count() >= 1);
    let size = bytes.len() as u64;
    for fetch in remote.fetches() {
        assert_eq!(fetch.path, URL);
        assert!(fetch.end_inclusive < size, "{fetch:?} outside {size} bytes");
    }
}

#[test]
fn index_lookup_reads_a_fraction_of_the_file() {
    let (_dir, bytes, remote, vfs) = remote_fixture();
    let conn = Connection::open_with(URL, vfs).unwrap();
    remote.clear_log();

    let result = conn
        .query("SELECT id FROM items WHERE name = ?1", &[Value::Text("item-1250".into())])
        .unwrap();
    assert_eq!(result.scalar(), Some(&Value::Integer(1250)));

    let fetched: u64 = remote
        .fetches()
        .iter()
        .map(|fetch| fetch.end_inclusive - fetch.start + 1)
        .sum();
    assert!(fetched < bytes.len() as u64 / 4, "fetched {fetched} of {}", bytes.len());
}

#[test]
fn named_parameters_skip_unknown_names() {
    let (_dir, _bytes, _remote, vfs) = remote_fixture();
    let conn = Connection::open_with(URL, vfs).unwrap();

    let mut stmt = conn
        .prepare("SELECT id FROM items WHERE id BETWEEN :low AND :high ORDER BY id")
        .unwrap();
    assert_eq!(stmt.parameter_count(), 2);
    assert_eq!(stmt.columns(), vec!["id"]);

    let result = stmt
        .query_named(&[
            (":low", Value::Integer(5)),
            (":high", Value::Integer(7)),
            (":unused", Value::Integer(0)),
        ])
        .unwrap();
    let ids: Vec<Value> = result.rows.into_iter().flatten().collect();
    assert_eq!(ids, vec![Value::Integer(5), Value::Integer(6), Value::Integer(7)]);

    // Rebinding reuses the compiled statement.
    let again = stmt
        .query_named(&[(":low", Value::Integer(ITEMS)), (":high", Value::Integer(ITEMS + 100))])
        .unwrap();
    assert_eq!(again.rows, vec![vec![Value::Integer(ITEMS)]]);
}

#[test]
fn null_columns_come_back_as_null() {
    let (_dir, _bytes, _remote, vfs) = remote_fixture();
    let conn = Connection::open_with(URL, vfs).unwrap();

    let result = conn
        .query("SELECT tag FROM items WHERE id = 10", &[])
        .unwrap();
    assert_eq!(result.rows, vec![vec![Value::Null]]);
}

#[test]
fn writes_are_refused() {
    let (_dir, _bytes, remote, vfs) = remote_fixture();
    let conn = Connection::open_with(URL, Arc::clone(&vfs)).unwrap();

    assert!(conn.query("CREATE TABLE other (x)", &[]).is_err());
    assert!(conn.query("DELETE FROM items", &[]).is_err());
    let count = conn.query("SELECT count(*) FROM items", &[]).unwrap();
    assert_eq!(count.scalar(), Some(&Value::Integer(ITEMS)));

    // A read-write open is refused before the resource is even looked up.
    remote.clear_log();
    let flags = rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_CREATE;
    assert!(rusqlite::Connection::open_with_flags_and_vfs(URL, flags, vfs.name()).is_err());
    assert_eq!(remote.fetch_count(), 0);
}

#[test]
fn missing_database_fails_to_open() {
    let (_dir, _bytes, _remote, vfs) = remote_fixture();
    let err = Connection::open_with("https://cdn.example.com/missing.db", vfs).unwrap_err();
    assert!(matches!(err, SqliteError::Open { .. }), "got {err:?}");
}

#[test]
fn serialize_returns_the_whole_image() {
    let (_dir, bytes, _remote, vfs) = remote_fixture();
    let conn = Connection::open_with(URL, vfs).unwrap();

    let image = conn.serialize().unwrap();
    assert_eq!(image.len(), bytes.len());
    assert_eq!(&image[..16], b"SQLite format 3\0");
}

#[test]
fn local_files_through_the_standard_composition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.db");
    build_database(&path);

    let registry = VfsRegistry::standard(
        &VfsConfig::default(),
        Arc::new(LocalFileSource::new()),
        Arc::new(SystemHost::new()),
    )
    .unwrap();
    let vfs = EngineVfs::register(registry).unwrap();

    let conn = Connection::open_with(path.to_str().unwrap(), vfs).unwrap();
    assert_eq!(conn.target(), path.to_str().unwrap());
    let result = conn
        .query("SELECT max(id), min(name) FROM items", &[])
        .unwrap();
    assert_eq!(
        result.rows,
        vec![vec![Value::Integer(ITEMS), Value::Text("item-001".into())]]
    );

    // Engine functions that need the clock reach the host.
    let now = conn.query("SELECT julianday('now') > 2400000.5", &[]).unwrap();
    assert_eq!(now.scalar(), Some(&Value::Integer(1)));
}

#[test]
fn connections_share_a_registration() {
    let (_dir, _bytes, _remote, vfs) = remote_fixture();
    let first = Connection::open_with(URL, Arc::clone(&vfs)).unwrap();
    let second = Connection::open_with(URL, Arc::clone(&vfs)).unwrap();
    assert_eq!(first.vfs().name(), second.vfs().name());

    drop(first);
    let count = second.query("SELECT count(*) FROM items", &[]).unwrap();
    assert_eq!(count.scalar(), Some(&Value::Integer(ITEMS)));
}
