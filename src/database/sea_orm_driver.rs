//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于 Sea-ORM 的同步驱动，用于 MySQL 与 PostgreSQL。
//!
//! 同步层是阻塞式的，驱动内部持有一个单工作线程的 tokio 运行时，
//! 每次调用都在其上 `block_on`。

use super::{
    value::{Row, SqlValue},
    Connection, Dialect, Statement,
};
use crate::error::{ConversionError, Result, StoreError};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection,
    FromQueryResult, JsonValue, QueryResult,
};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

struct Inner {
    runtime: tokio::runtime::Runtime,
    conn: Option<DatabaseConnection>,
}

impl Inner {
    fn conn(&self) -> Result<&DatabaseConnection> {
        self.conn
            .as_ref()
            .ok_or_else(|| StoreError::Connection("connection already closed".to_string()))
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = self.runtime.block_on(conn.close()) {
                warn!("Failed to close database connection: {}", e);
            }
        }
    }
}

/// Sea-ORM 连接
pub struct SeaOrmConnection {
    inner: Rc<Inner>,
    dialect: Dialect,
}

impl SeaOrmConnection {
    /// 建立单连接池
    pub fn connect(url: &str, connect_timeout: Duration) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        let mut opt = ConnectOptions::new(url.to_string());
        opt.max_connections(1)
            .min_connections(1)
            .connect_timeout(connect_timeout)
            .sqlx_logging(false);

        let conn = runtime
            .block_on(Database::connect(opt))
            .map_err(|e| StoreError::Connection(format!("Failed to open database: {}", e)))?;

        let dialect = match conn.get_database_backend() {
            DatabaseBackend::MySql => Dialect::MySql,
            DatabaseBackend::Postgres => Dialect::Postgres,
            DatabaseBackend::Sqlite => Dialect::Sqlite,
        };
        debug!("Sea-ORM connection established ({})", dialect);

        Ok(Self {
            inner: Rc::new(Inner {
                runtime,
                conn: Some(conn),
            }),
            dialect,
        })
    }
}

fn backend(dialect: Dialect) -> DatabaseBackend {
    match dialect {
        Dialect::MySql => DatabaseBackend::MySql,
        Dialect::Postgres => DatabaseBackend::Postgres,
        Dialect::Sqlite => DatabaseBackend::Sqlite,
    }
}

fn to_sea_value(value: &SqlValue) -> sea_orm::Value {
    match value {
        SqlValue::Null => sea_orm::Value::String(None),
        SqlValue::Bool(b) => sea_orm::Value::Bool(Some(*b)),
        SqlValue::Integer(i) => sea_orm::Value::BigInt(Some(*i)),
        SqlValue::Real(f) => sea_orm::Value::Double(Some(*f)),
        SqlValue::Text(s) => sea_orm::Value::String(Some(Box::new(s.clone()))),
        SqlValue::Blob(b) => sea_orm::Value::Bytes(Some(Box::new(b.clone()))),
    }
}

fn from_json(value: JsonValue) -> SqlValue {
    match value {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n
                .as_f64()
                .map(SqlValue::Real)
                .unwrap_or_else(|| SqlValue::Text(n.to_string())),
        },
        JsonValue::String(s) => SqlValue::Text(s),
        other => SqlValue::Text(other.to_string()),
    }
}

/// 二进制列在 JSON 读取器中表现为字节数组
fn bytes_from_json(value: JsonValue) -> SqlValue {
    match value {
        JsonValue::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            match bytes {
                Some(bytes) => SqlValue::Blob(bytes),
                None => from_json(JsonValue::Array(items)),
            }
        }
        other => from_json(other),
    }
}

fn is_binary_type(name: &str) -> bool {
    matches!(
        name,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BYTEA"
    )
}

/// 结果集中的二进制列名
fn binary_columns(result: &QueryResult) -> Vec<String> {
    use sea_orm::sqlx::{Column, Row as SqlxRow, TypeInfo};

    fn collect<R: SqlxRow>(row: &R) -> Vec<String> {
        row.columns()
            .iter()
            .filter(|column| is_binary_type(column.type_info().name()))
            .map(|column| column.name().to_string())
            .collect()
    }

    if let Some(row) = result.try_as_mysql_row() {
        collect(row)
    } else if let Some(row) = result.try_as_pg_row() {
        collect(row)
    } else if let Some(row) = result.try_as_sqlite_row() {
        collect(row)
    } else {
        Vec::new()
    }
}

/// 按 SELECT 列顺序还原一行
///
/// JSON 读取器跳过无法识别类型的列，这类列以错误返回而不是静默丢弃
fn hydrate(result: &QueryResult) -> Result<Row> {
    let binary = binary_columns(result);
    let cells = match JsonValue::from_query_result(result, "")? {
        JsonValue::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    let mut pairs = Vec::new();
    for column in result.column_names() {
        let value = cells.get(&column).cloned().ok_or_else(|| StoreError::Hydration {
            column: column.clone(),
            source: ConversionError::Parse {
                target: "column",
                reason: "unsupported database column type".to_string(),
            },
        })?;
        let value = if binary.contains(&column) {
            bytes_from_json(value)
        } else {
            from_json(value)
        };
        pairs.push((column, value));
    }
    Ok(Row::from_pairs(pairs))
}

impl Connection for SeaOrmConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let conn = self.inner.conn()?;
        let results = self.inner.runtime.block_on(conn.query_all(
            sea_orm::Statement::from_string(backend(self.dialect), sql.to_string()),
        ))?;

        results.iter().map(hydrate).collect()
    }

    /// 服务端预编译推迟到首次执行；此处只拒绝空语句
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>> {
        if sql.trim().is_empty() {
            return Err(StoreError::prepare(sql, "empty statement"));
        }
        self.inner.conn()?;
        Ok(Box::new(SeaOrmStatement {
            inner: Rc::clone(&self.inner),
            backend: backend(self.dialect),
            sql: sql.to_string(),
        }))
    }
}

struct SeaOrmStatement {
    inner: Rc<Inner>,
    backend: DatabaseBackend,
    sql: String,
}

impl Statement for SeaOrmStatement {
    fn execute(&mut self, params: &[SqlValue]) -> Result<u64> {
        let conn = self.inner.conn()?;
        let stmt = sea_orm::Statement::from_sql_and_values(
            self.backend,
            self.sql.as_str(),
            params.iter().map(to_sea_value),
        );
        let result = self.inner.runtime.block_on(conn.execute(stmt))?;
        Ok(result.rows_affected())
    }
}
