//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于 rusqlite 的SQLite驱动。

use super::{
    connection_string::{ensure_database_directory, SqliteTarget},
    value::{Row, SqlValue},
    Connection, Dialect, Statement,
};
use crate::error::{Result, StoreError};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, ToSql};
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(f) => SqlValue::Real(f),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    }
}

/// SQLite连接
///
/// 单线程持有；预编译语句共享同一个底层连接
pub struct SqliteConnection {
    conn: Rc<rusqlite::Connection>,
}

impl SqliteConnection {
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(rusqlite::Connection::open_in_memory()?))
    }

    /// 打开文件数据库，目录不存在时自动创建
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure_database_directory(path)?;
        debug!("Opening SQLite database at {}", path.display());
        Ok(Self::from_connection(rusqlite::Connection::open(path)?))
    }

    pub fn open_target(target: &SqliteTarget) -> Result<Self> {
        match target {
            SqliteTarget::Memory => Self::open_in_memory(),
            SqliteTarget::File(path) => Self::open(path),
        }
    }

    /// 从 `sqlite:` 连接字符串打开
    pub fn open_url(url: &str) -> Result<Self> {
        Self::open_target(&SqliteTarget::parse(url)?)
    }

    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Rc::new(conn),
        }
    }

    /// 底层连接，用于建表等同步层之外的操作
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                values.push(from_value_ref(row.get_ref(index)?));
            }
            result.push(Row::new(columns.clone(), values));
        }
        Ok(result)
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>> {
        self.conn
            .prepare_cached(sql)
            .map_err(|e| StoreError::prepare(sql, e))?;
        Ok(Box::new(SqliteStatement {
            conn: Rc::clone(&self.conn),
            sql: sql.to_string(),
        }))
    }
}

/// 已通过编译检查的语句，执行时从连接的语句缓存中取出
struct SqliteStatement {
    conn: Rc<rusqlite::Connection>,
    sql: String,
}

impl Statement for SqliteStatement {
    fn execute(&mut self, params: &[SqlValue]) -> Result<u64> {
        let mut stmt = self.conn.prepare_cached(&self.sql)?;
        let affected = stmt.execute(params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }
}
