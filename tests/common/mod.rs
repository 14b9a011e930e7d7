//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了测试的通用工具函数和设置。

#![allow(dead_code)]

use oxstore::{HasPrimaryKey, Record, SqliteConnection};
use std::sync::Once;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn setup_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(EnvFilter::new("debug"))
            .try_init()
            .ok();
    });
}

/// 测试表中的一行
#[derive(Debug, Clone, PartialEq, Record)]
pub struct Item {
    pub id: i64,
    pub name: String,
}

impl Item {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// 以 `code` 而非 `id` 作为缓存键的记录
#[derive(Debug, Clone, PartialEq, Record)]
#[record(primary_key)]
pub struct Sku {
    pub id: i64,
    pub code: String,
}

impl HasPrimaryKey for Sku {
    type Key = String;

    fn primary_key(&self) -> String {
        self.code.clone()
    }
}

pub const CREATE_ITEMS: &str = "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL)";

/// 建表并写入三行 `{1,"name1"} {2,"name2"} {3,"name3"}`
pub fn seeded_connection() -> SqliteConnection {
    let conn = SqliteConnection::open_in_memory().expect("open in-memory sqlite");
    seed(&conn);
    conn
}

pub fn seed(conn: &SqliteConnection) {
    conn.inner()
        .execute_batch(&format!(
            "{};
             INSERT INTO items (id, name) VALUES (1, 'name1'), (2, 'name2'), (3, 'name3');",
            CREATE_ITEMS
        ))
        .expect("seed items table");
}

/// 按 `id` 排序读出整表
pub fn table_rows(conn: &rusqlite::Connection) -> Vec<(i64, String)> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM items ORDER BY id")
        .expect("prepare select");
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("query items")
        .collect::<rusqlite::Result<Vec<_>>>()
        .expect("read items")
}
