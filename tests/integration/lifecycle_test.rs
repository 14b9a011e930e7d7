//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 生命周期管理集成测试

use oxstore::{LifecycleState, Managed, SqlStorage, SqliteConnection, Store};

#[path = "../common/mod.rs"]
mod common;

use common::{seeded_connection, table_rows, Item};

/// 文件数据库，便于在存储对象释放后重新打开检查
fn file_storage(dir: &tempfile::TempDir) -> (std::path::PathBuf, SqlStorage<Item, SqliteConnection>) {
    let path = dir.path().join("lifecycle.db");
    let conn = SqliteConnection::open(&path).unwrap();
    common::seed(&conn);
    (path.clone(), SqlStorage::new(conn, "items").unwrap())
}

#[test]
fn test_start_runs_on_init() {
    common::setup_logging();
    let storage: SqlStorage<Item, _> = SqlStorage::new(seeded_connection(), "items").unwrap();
    let managed = Managed::start(storage).unwrap();

    assert_eq!(managed.state(), LifecycleState::Initialized);
    assert_eq!(managed.count(), 3);
}

#[test]
fn test_shutdown_runs_on_destroy() {
    common::setup_logging();
    let storage: SqlStorage<Item, _> = SqlStorage::new(seeded_connection(), "items").unwrap();
    let mut managed = Managed::start(storage).unwrap();

    managed.remove("1");
    managed.save("5", Item::new(5, "name5"));
    let report = managed.shutdown().unwrap();

    assert_eq!(report.upserted, 3);
    assert_eq!(report.deleted, 1);
}

#[test]
fn test_drop_persists_exactly_once() {
    common::setup_logging();
    let dir = tempfile::tempdir().unwrap();
    let (path, storage) = file_storage(&dir);

    {
        let mut managed = Managed::start(storage).unwrap();
        managed.remove("2");
    }

    let conn = SqliteConnection::open(&path).unwrap();
    assert_eq!(
        table_rows(conn.inner()),
        vec![(1, "name1".to_string()), (3, "name3".to_string())]
    );
}

#[test]
fn test_uninitialized_container_never_touches_table() {
    common::setup_logging();
    let dir = tempfile::tempdir().unwrap();
    let (path, storage) = file_storage(&dir);

    {
        let mut managed = Managed::new(storage);
        managed.save("9", Item::new(9, "never written"));
    }

    let conn = SqliteConnection::open(&path).unwrap();
    assert_eq!(table_rows(conn.inner()).len(), 3);
}
