//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 数据库驱动抽象
//!
//! 同步层只依赖 [`Connection`] / [`Statement`] 两个特征：整表读取、
//! 预编译带参语句、按位置绑定标量参数执行。提供 rusqlite 与 sea-orm 两种实现。

pub mod connection_string;
pub mod sea_orm_driver;
pub mod sqlite;
pub mod value;

use crate::config::DatabaseConfig;
use crate::error::{Result, StoreError};
use crate::utils::{redaction::redact_connection_string, validate_identifier};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::info;

pub use connection_string::SqliteTarget;
pub use sea_orm_driver::SeaOrmConnection;
pub use sqlite::SqliteConnection;
pub use value::{FromSqlValue, Row, SqlValue};

/// 表的唯一性约束列
pub const ID_COLUMN: &str = "id";

/// 单条删除语句绑定的 `id` 上限
///
/// 远低于 SQLite（32766）与 MySQL/PostgreSQL（65535）的参数个数上限
pub const DELETE_BATCH_SIZE: usize = 500;

/// 已预编译的语句
#[cfg_attr(test, mockall::automock)]
pub trait Statement {
    /// 按位置绑定参数并执行，返回受影响的行数
    fn execute(&mut self, params: &[SqlValue]) -> Result<u64>;
}

/// 数据库连接
///
/// `prepare` 失败以 `Err(StoreError::Prepare { .. })` 表示，与成功预编译的语句可区分
#[cfg_attr(test, mockall::automock)]
pub trait Connection {
    /// 连接所使用的SQL方言
    fn dialect(&self) -> Dialect;

    /// 执行无参查询并返回全部结果行
    fn query(&self, sql: &str) -> Result<Vec<Row>>;

    /// 预编译语句
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>>;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        (**self).query(sql)
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>> {
        (**self).prepare(sql)
    }
}

/// SQL方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    MySql,
    Sqlite,
    Postgres,
}

impl Dialect {
    /// 从连接字符串推断方言
    ///
    /// 未知的 scheme 返回配置错误，错误信息只包含 scheme 部分
    pub fn from_url(url: &str) -> Result<Self> {
        let lower = url.trim().to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Ok(Dialect::Postgres)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Ok(Dialect::MySql)
        } else if lower.starts_with("sqlite:") {
            Ok(Dialect::Sqlite)
        } else {
            let scheme = lower.split(':').next().unwrap_or_default();
            Err(StoreError::Config(format!(
                "unsupported database url scheme '{}', expected sqlite, mysql or postgres",
                scheme
            )))
        }
    }

    /// 引用标识符
    ///
    /// 标识符在进入此处之前已通过 [`validate_identifier`]
    pub fn quote(&self, identifier: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", identifier),
            Dialect::Sqlite | Dialect::Postgres => format!("\"{}\"", identifier),
        }
    }

    /// 第 `index` 个参数占位符（从1开始）
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    fn placeholders(&self, count: usize) -> String {
        (1..=count)
            .map(|i| self.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 整表读取
    pub fn select_all(&self, table: &TableName) -> String {
        format!("SELECT * FROM {}", self.quote(table.as_str()))
    }

    /// 插入整行，主键冲突时更新除 `id` 外的所有列
    ///
    /// 列名不合法时返回错误，调用方将其视为预编译失败
    pub fn upsert(&self, table: &TableName, columns: &[String]) -> Result<String> {
        for column in columns {
            validate_identifier(column)?;
        }

        let column_list = columns
            .iter()
            .map(|c| self.quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        let updatable: Vec<&String> = columns.iter().filter(|c| *c != ID_COLUMN).collect();

        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote(table.as_str()),
            column_list,
            self.placeholders(columns.len())
        );

        let conflict = match self {
            Dialect::MySql if updatable.is_empty() => {
                let id = self.quote(ID_COLUMN);
                format!("ON DUPLICATE KEY UPDATE {} = {}", id, id)
            }
            Dialect::MySql => format!(
                "ON DUPLICATE KEY UPDATE {}",
                updatable
                    .iter()
                    .map(|c| {
                        let quoted = self.quote(c);
                        format!("{} = VALUES({})", quoted, quoted)
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Dialect::Sqlite | Dialect::Postgres if updatable.is_empty() => {
                format!("ON CONFLICT ({}) DO NOTHING", self.quote(ID_COLUMN))
            }
            Dialect::Sqlite | Dialect::Postgres => format!(
                "ON CONFLICT ({}) DO UPDATE SET {}",
                self.quote(ID_COLUMN),
                updatable
                    .iter()
                    .map(|c| {
                        let quoted = self.quote(c);
                        format!("{} = excluded.{}", quoted, quoted)
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };

        Ok(format!("{} {}", insert, conflict))
    }

    /// 读取表中全部 `id`
    pub fn select_ids(&self, table: &TableName) -> String {
        format!(
            "SELECT {} FROM {}",
            self.quote(ID_COLUMN),
            self.quote(table.as_str())
        )
    }

    /// 按 `id` 删除 `count` 行
    pub fn delete_in(&self, table: &TableName, count: usize) -> String {
        format!(
            "DELETE FROM {} WHERE {} IN ({})",
            self.quote(table.as_str()),
            self.quote(ID_COLUMN),
            self.placeholders(count)
        )
    }

    /// 清空整表
    pub fn truncate(&self, table: &TableName) -> String {
        match self {
            Dialect::Sqlite => format!("DELETE FROM {}", self.quote(table.as_str())),
            Dialect::MySql | Dialect::Postgres => {
                format!("TRUNCATE TABLE {}", self.quote(table.as_str()))
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        };
        f.write_str(name)
    }
}

/// 经过校验的表名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 按配置打开连接
///
/// `sqlite:` 使用 rusqlite，其余交给 sea-orm
pub fn connect(config: &DatabaseConfig) -> Result<Box<dyn Connection>> {
    let url = config.url.expose_secret();
    let dialect = Dialect::from_url(url)?;
    info!(
        "Opening {} connection: {}",
        dialect,
        redact_connection_string(url)
    );

    match dialect {
        Dialect::Sqlite => {
            let target = SqliteTarget::parse(url)?;
            Ok(Box::new(SqliteConnection::open_target(&target)?))
        }
        Dialect::MySql | Dialect::Postgres => Ok(Box::new(SeaOrmConnection::connect(
            url,
            Duration::from_secs(config.connect_timeout_secs),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableName {
        TableName::new("items").unwrap()
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dialect_from_url() {
        assert_eq!(Dialect::from_url("mysql://u:p@h/db").unwrap(), Dialect::MySql);
        assert_eq!(Dialect::from_url("postgresql://h/db").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_url("postgres://h/db").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_url("sqlite::memory:").unwrap(), Dialect::Sqlite);
    }

    #[test]
    fn test_unknown_scheme_is_rejected_without_credentials() {
        let err = Dialect::from_url("mysq://app:pw@db/shop").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
        assert!(err.to_string().contains("'mysq'"));
        assert!(!err.to_string().contains("pw"));
        assert!(Dialect::from_url("./data/app.db").is_err());
    }

    #[test]
    fn test_connect_rejects_unknown_scheme_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("mysq://app:pw@{}/shop", dir.path().display());
        assert!(connect(&DatabaseConfig::new(url)).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_mysql_upsert_excludes_id_from_update() {
        let sql = Dialect::MySql
            .upsert(&table(), &columns(&["id", "name", "price"]))
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `items` (`id`, `name`, `price`) VALUES (?, ?, ?) \
             ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `price` = VALUES(`price`)"
        );
    }

    #[test]
    fn test_sqlite_upsert_uses_on_conflict() {
        let sql = Dialect::Sqlite
            .upsert(&table(), &columns(&["id", "name"]))
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"items\" (\"id\", \"name\") VALUES (?, ?) \
             ON CONFLICT (\"id\") DO UPDATE SET \"name\" = excluded.\"name\""
        );
    }

    #[test]
    fn test_postgres_placeholders_are_numbered() {
        let sql = Dialect::Postgres
            .upsert(&table(), &columns(&["id", "name"]))
            .unwrap();
        assert!(sql.contains("VALUES ($1, $2)"));
        assert_eq!(
            Dialect::Postgres.delete_in(&table(), 3),
            "DELETE FROM \"items\" WHERE \"id\" IN ($1, $2, $3)"
        );
    }

    #[test]
    fn test_id_only_upsert_is_a_no_op_update() {
        let only_id = columns(&["id"]);
        assert!(Dialect::MySql
            .upsert(&table(), &only_id)
            .unwrap()
            .ends_with("ON DUPLICATE KEY UPDATE `id` = `id`"));
        assert!(Dialect::Sqlite
            .upsert(&table(), &only_id)
            .unwrap()
            .ends_with("ON CONFLICT (\"id\") DO NOTHING"));
    }

    #[test]
    fn test_upsert_rejects_invalid_column() {
        let result = Dialect::MySql.upsert(&table(), &columns(&["id", "name`; --"]));
        assert!(matches!(result, Err(StoreError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_delete_and_truncate() {
        assert_eq!(
            Dialect::MySql.delete_in(&table(), 2),
            "DELETE FROM `items` WHERE `id` IN (?, ?)"
        );
        assert_eq!(Dialect::MySql.select_ids(&table()), "SELECT `id` FROM `items`");
        assert_eq!(Dialect::MySql.truncate(&table()), "TRUNCATE TABLE `items`");
        assert_eq!(Dialect::Sqlite.truncate(&table()), "DELETE FROM \"items\"");
        assert_eq!(Dialect::Sqlite.select_all(&table()), "SELECT * FROM \"items\"");
    }

    #[test]
    fn test_table_name_is_validated() {
        assert!(TableName::new("items").is_ok());
        assert!(TableName::new("items; DROP TABLE users").is_err());
    }
}
