//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! SQLite 存储同步集成测试

use oxstore::{
    EmptySurvivorPolicy, Loadable, Persistable, PersistReport, SqlStorage, SqliteConnection,
    Store,
};

#[path = "../common/mod.rs"]
mod common;

use common::{seeded_connection, table_rows, Item, Sku};

fn storage() -> SqlStorage<Item, SqliteConnection> {
    common::setup_logging();
    SqlStorage::new(seeded_connection(), "items").unwrap()
}

fn rows(storage: &SqlStorage<Item, SqliteConnection>) -> Vec<(i64, String)> {
    table_rows(storage.connection().inner())
}

#[test]
fn test_load_populates_cache_by_id() {
    let mut storage = storage();
    assert_eq!(storage.load().unwrap(), 3);
    assert_eq!(storage.count(), 3);
    assert_eq!(storage.find("2").unwrap().name, "name2");
}

#[test]
fn test_removed_record_is_deleted_on_persist() {
    let mut storage = storage();
    storage.load().unwrap();
    storage.remove("3");

    let report = storage.persist().unwrap();
    assert_eq!(report.upserted, 2);
    assert_eq!(report.deleted, 1);
    assert_eq!(
        rows(&storage),
        vec![(1, "name1".to_string()), (2, "name2".to_string())]
    );
}

#[test]
fn test_new_record_is_inserted() {
    let mut storage = storage();
    storage.load().unwrap();
    storage.save("4", Item::new(4, "name4"));

    storage.persist().unwrap();
    assert!(rows(&storage).contains(&(4, "name4".to_string())));
    assert_eq!(rows(&storage).len(), 4);
}

#[test]
fn test_resaved_record_updates_without_duplicate() {
    let mut storage = storage();
    storage.load().unwrap();
    storage.save("2", Item::new(2, "replaced"));

    storage.persist().unwrap();
    assert_eq!(
        rows(&storage),
        vec![
            (1, "name1".to_string()),
            (2, "replaced".to_string()),
            (3, "name3".to_string())
        ]
    );
}

#[test]
fn test_load_then_persist_leaves_table_unchanged() {
    let mut storage = storage();
    let before = rows(&storage);
    storage.load().unwrap();
    storage.persist().unwrap();
    assert_eq!(rows(&storage), before);
}

#[test]
fn test_persist_is_idempotent() {
    let mut storage = storage();
    storage.load().unwrap();
    storage.remove("1");

    storage.persist().unwrap();
    let once = rows(&storage);
    let second = storage.persist().unwrap();
    assert_eq!(second.deleted, 0);
    assert_eq!(rows(&storage), once);
}

#[test]
fn test_empty_cache_is_a_no_op() {
    let mut storage = storage();
    let report = storage.persist().unwrap();
    assert_eq!(report, PersistReport::skipped());
    assert_eq!(rows(&storage).len(), 3);
}

#[test]
fn test_prepare_failure_discards_cache() {
    common::setup_logging();
    let conn = SqliteConnection::open_in_memory().unwrap();
    let mut storage: SqlStorage<Item, _> = SqlStorage::new(conn, "items").unwrap();
    storage.save("1", Item::new(1, "orphan"));

    let err = storage.persist().unwrap_err();
    assert!(err.is_prepare_failure());
    assert_eq!(storage.count(), 0);
}

#[test]
fn test_truncate_policy_with_keyless_cache() {
    #[derive(oxstore::Record)]
    struct NameOnly {
        name: String,
    }

    common::setup_logging();
    let conn = SqliteConnection::open_in_memory().unwrap();
    conn.inner()
        .execute_batch(
            "CREATE TABLE names (id INTEGER UNIQUE, name TEXT);
             INSERT INTO names VALUES (1, 'old');",
        )
        .unwrap();

    let mut storage: SqlStorage<NameOnly, _> = SqlStorage::new(conn, "names")
        .unwrap()
        .with_empty_survivor_policy(EmptySurvivorPolicy::Truncate);
    storage.save("", NameOnly { name: "new".into() });

    let report = storage.persist().unwrap();
    assert_eq!(report.upserted, 1);
    let remaining: i64 = storage
        .connection()
        .inner()
        .query_row("SELECT COUNT(*) FROM names", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn test_primary_key_capability_drives_cache_keys() {
    common::setup_logging();
    let conn = SqliteConnection::open_in_memory().unwrap();
    conn.inner()
        .execute_batch(
            "CREATE TABLE skus (id INTEGER PRIMARY KEY, code TEXT NOT NULL);
             INSERT INTO skus VALUES (1, 'A-1'), (2, 'B-2');",
        )
        .unwrap();

    let mut storage: SqlStorage<Sku, _> = SqlStorage::new(conn, "skus").unwrap();
    storage.load().unwrap();
    assert_eq!(storage.find("B-2").map(|sku| sku.id), Some(2));
    assert!(storage.find("2").is_none());
}

#[test]
fn test_file_backed_round_trip() {
    common::setup_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db").join("items.db");

    {
        let conn = SqliteConnection::open(&path).unwrap();
        common::seed(&conn);
        let mut storage: SqlStorage<Item, _> = SqlStorage::new(conn, "items").unwrap();
        storage.load().unwrap();
        storage.save("2", Item::new(2, "changed"));
        storage.remove("1");
        storage.persist().unwrap();
    }

    let conn = SqliteConnection::open(&path).unwrap();
    let mut storage: SqlStorage<Item, _> = SqlStorage::new(conn, "items").unwrap();
    assert_eq!(storage.load().unwrap(), 2);
    assert_eq!(storage.find("2").unwrap().name, "changed");
    assert!(!storage.contains_key("1"));
}

#[test]
#[serial_test::serial]
fn test_sync_updates_global_metrics() {
    use oxstore::metrics::{Counter, GLOBAL_METRICS};

    common::setup_logging();
    let conn = SqliteConnection::open_in_memory().unwrap();
    conn.inner()
        .execute_batch(&common::CREATE_ITEMS.replace("items", "metered"))
        .unwrap();
    let mut storage: SqlStorage<Item, _> = SqlStorage::new(conn, "metered").unwrap();

    let before = GLOBAL_METRICS.counter("metered", Counter::PersistSkipped);
    storage.persist().unwrap();
    assert_eq!(
        GLOBAL_METRICS.counter("metered", Counter::PersistSkipped),
        before + 1
    );

    storage.save("1", Item::new(1, "a"));
    storage.save("2", Item::new(2, "b"));
    let upserted = GLOBAL_METRICS.counter("metered", Counter::RecordsUpserted);
    storage.persist().unwrap();
    assert_eq!(
        GLOBAL_METRICS.counter("metered", Counter::RecordsUpserted),
        upserted + 2
    );
    assert!(oxstore::metrics::render().contains("store_records_upserted_total{table=\"metered\"}"));
}

#[test]
fn test_cache_larger_than_bind_limit_persists() {
    let mut storage: SqlStorage<Item, _> = SqlStorage::new(seeded_connection(), "items").unwrap();
    for id in 1..=40_000 {
        storage.save(id.to_string(), Item::new(id, &format!("name{}", id)));
    }
    let report = storage.persist().unwrap();
    assert_eq!(report.upserted, 40_000);
    assert_eq!(report.deleted, 0);
    assert_eq!(storage.count(), 40_000);

    let table: i64 = storage
        .connection()
        .inner()
        .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
        .unwrap();
    assert_eq!(table, 40_000);

    for id in 2..=40_000 {
        storage.remove(&id.to_string());
    }
    assert_eq!(storage.persist().unwrap().deleted, 39_999);
    assert_eq!(rows(&storage), vec![(1, "name1".to_string())]);
}
