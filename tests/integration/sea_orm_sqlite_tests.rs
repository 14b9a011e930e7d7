//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! Sea-ORM 驱动在 SQLite 内存数据库上的集成测试

use chrono::{DateTime, TimeZone, Utc};
use oxstore::{
    Connection, Loadable, Persistable, Record, SeaOrmConnection, SqlStorage, SqlValue, Store,
};
use std::time::Duration;

#[path = "../common/mod.rs"]
mod common;

use common::{Item, CREATE_ITEMS};

fn connection() -> SeaOrmConnection {
    common::setup_logging();
    let conn = SeaOrmConnection::connect("sqlite::memory:", Duration::from_secs(5)).unwrap();
    conn.prepare(CREATE_ITEMS).unwrap().execute(&[]).unwrap();
    let mut insert = conn
        .prepare("INSERT INTO items (id, name) VALUES (?, ?)")
        .unwrap();
    for id in 1..=3 {
        insert
            .execute(&[SqlValue::Integer(id), SqlValue::Text(format!("name{}", id))])
            .unwrap();
    }
    conn
}

fn ids(conn: &SeaOrmConnection) -> Vec<i64> {
    let mut ids: Vec<i64> = conn
        .query("SELECT id FROM items")
        .unwrap()
        .iter()
        .map(|row| row.get::<i64>("id").unwrap())
        .collect();
    ids.sort();
    ids
}

#[test]
fn test_query_hydrates_rows() {
    let conn = connection();
    let rows = conn.query("SELECT * FROM items WHERE id = 2").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<String>("name").unwrap(), "name2");
}

#[test]
fn test_load_and_persist_round_trip() {
    let mut storage: SqlStorage<Item, _> = SqlStorage::new(connection(), "items").unwrap();
    assert_eq!(storage.load().unwrap(), 3);

    storage.remove("3");
    storage.save("2", Item::new(2, "replaced"));
    storage.save("4", Item::new(4, "name4"));
    let report = storage.persist().unwrap();

    assert_eq!(report.upserted, 3);
    assert_eq!(report.deleted, 1);
    assert_eq!(ids(storage.connection()), vec![1, 2, 4]);

    storage.clear();
    assert_eq!(storage.load().unwrap(), 3);
    assert_eq!(storage.find("2").unwrap().name, "replaced");
}

#[test]
fn test_compile_errors_surface_on_execute() {
    let conn = connection();
    let mut stmt = conn.prepare("INSERT INTO missing (id) VALUES (?)").unwrap();
    assert!(stmt.execute(&[SqlValue::Integer(1)]).is_err());
}

#[derive(Debug, Clone, PartialEq, Record)]
struct Event {
    id: i64,
    happened_at: Option<DateTime<Utc>>,
}

#[test]
fn test_temporal_column_survives_load_and_persist() {
    common::setup_logging();
    let conn = SeaOrmConnection::connect("sqlite::memory:", Duration::from_secs(5)).unwrap();
    conn.prepare("CREATE TABLE events (id INTEGER PRIMARY KEY, happened_at DATETIME)")
        .unwrap()
        .execute(&[])
        .unwrap();
    conn.prepare("INSERT INTO events (id, happened_at) VALUES (1, '2024-03-01 12:30:00')")
        .unwrap()
        .execute(&[])
        .unwrap();

    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let mut storage: SqlStorage<Event, _> = SqlStorage::new(conn, "events").unwrap();
    assert_eq!(storage.load().unwrap(), 1);
    assert_eq!(storage.find("1").unwrap().happened_at, Some(at));

    storage.persist().unwrap();
    storage.clear();
    storage.load().unwrap();
    assert_eq!(storage.find("1").unwrap().happened_at, Some(at));
}

#[test]
fn test_rows_follow_select_order_and_keep_blobs() {
    let conn = connection();
    conn.prepare("CREATE TABLE files (id INTEGER PRIMARY KEY, body BLOB)")
        .unwrap()
        .execute(&[])
        .unwrap();
    conn.prepare("INSERT INTO files (id, body) VALUES (1, X'6869')")
        .unwrap()
        .execute(&[])
        .unwrap();

    let rows = conn.query("SELECT body, id FROM files").unwrap();
    assert_eq!(rows[0].columns(), ["body".to_string(), "id".to_string()]);
    assert_eq!(rows[0].value("body"), Some(&SqlValue::Blob(b"hi".to_vec())));
}
