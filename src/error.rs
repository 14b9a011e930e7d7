//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步层的错误类型和处理机制。

use thiserror::Error;

/// 存储同步错误类型枚举
///
/// 加载与持久化过程中可能出现的全部错误
#[derive(Error, Debug)]
pub enum StoreError {
    /// 语句预编译失败
    ///
    /// 同步器遇到该错误时会先清空缓存再向上抛出
    #[error("Failed to prepare statement `{sql}`: {reason}")]
    Prepare { sql: String, reason: String },

    /// SQLite驱动错误
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Sea-ORM数据库错误
    #[error("Sea-ORM error: {0}")]
    SeaOrm(#[from] sea_orm::DbErr),

    /// 行数据无法转换为记录类型
    #[error("Cannot hydrate column `{column}`: {source}")]
    Hydration {
        column: String,
        #[source]
        source: ConversionError,
    },

    /// 非法的表名或列名
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 数据库连接错误
    #[error("Database connection error: {0}")]
    Connection(String),

    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// 构造预编译失败错误
    pub fn prepare(sql: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Prepare {
            sql: sql.into(),
            reason: reason.to_string(),
        }
    }

    /// 是否为预编译失败
    pub fn is_prepare_failure(&self) -> bool {
        matches!(self, StoreError::Prepare { .. })
    }
}

/// 单元格值转换错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// 类型不匹配
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// 数值超出目标类型范围
    #[error("value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    /// 文本解析失败
    #[error("cannot parse {target}: {reason}")]
    Parse {
        target: &'static str,
        reason: String,
    },

    /// 列不存在
    #[error("column not found")]
    MissingColumn,
}

/// 同步操作结果类型别名
pub type Result<T> = std::result::Result<T, StoreError>;
