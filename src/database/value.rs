//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了绑定参数与结果行共用的标量值类型，以及行到字段的转换。

use crate::error::{ConversionError, Result, StoreError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// SQL标量值
///
/// 既是语句绑定参数的形式，也是结果集单元格的形式
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// 类型名称，用于错误信息
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Integer(_) => "integer",
            SqlValue::Real(_) => "real",
            SqlValue::Text(_) => "text",
            SqlValue::Blob(_) => "blob",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// 将值渲染为缓存键
    ///
    /// 布尔值 true 为 "1"，false 与 null 为空串
    pub fn to_key_string(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Bool(true) => "1".to_string(),
            SqlValue::Bool(false) => String::new(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
            SqlValue::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
            other => write!(f, "{}", other.to_key_string()),
        }
    }
}

/// 结果集中的一行
///
/// 列名保持查询返回的顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// 从 (列名, 值) 对构造
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, SqlValue)>,
        K: Into<String>,
    {
        let (columns, values) = pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 按列名取原始值
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// 按列名取值并转换为目标类型
    ///
    /// 列缺失时仅可选类型能够成功（得到 `None`）
    pub fn get<T: FromSqlValue>(&self, column: &str) -> Result<T> {
        let converted = match self.value(column) {
            Some(value) => T::from_sql_value(value),
            None => T::from_missing().ok_or(ConversionError::MissingColumn),
        };
        converted.map_err(|source| StoreError::Hydration {
            column: column.to_string(),
            source,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// 从SQL标量值转换
pub trait FromSqlValue: Sized {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError>;

    /// 列不存在时的取值，默认视为错误
    fn from_missing() -> Option<Self> {
        None
    }
}

fn mismatch<T>(expected: &'static str, found: &SqlValue) -> std::result::Result<T, ConversionError> {
    Err(ConversionError::TypeMismatch {
        expected,
        found: found.type_name(),
    })
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }

    fn from_missing() -> Option<Self> {
        Some(None)
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Integer(i) => Ok(*i != 0),
            SqlValue::Text(s) => match s.as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" | "" => Ok(false),
                _ => Err(ConversionError::Parse {
                    target: "bool",
                    reason: format!("unexpected text {:?}", s),
                }),
            },
            other => mismatch("bool", other),
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        match value {
            SqlValue::Integer(i) => Ok(*i),
            SqlValue::Bool(b) => Ok(*b as i64),
            // MySQL 驱动常以文本返回 DECIMAL/BIGINT
            SqlValue::Text(s) => s.trim().parse().map_err(|e| ConversionError::Parse {
                target: "i64",
                reason: format!("{}", e),
            }),
            other => mismatch("integer", other),
        }
    }
}

macro_rules! impl_from_sql_int {
    ($($ty:ty),*) => {
        $(
            impl FromSqlValue for $ty {
                fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
                    let wide = i64::from_sql_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                        value: wide.to_string(),
                        target: stringify!($ty),
                    })
                }
            }
        )*
    };
}

impl_from_sql_int!(i8, i16, i32, u8, u16, u32, u64, usize);

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        match value {
            SqlValue::Real(f) => Ok(*f),
            SqlValue::Integer(i) => Ok(*i as f64),
            SqlValue::Text(s) => s.trim().parse().map_err(|e| ConversionError::Parse {
                target: "f64",
                reason: format!("{}", e),
            }),
            other => mismatch("real", other),
        }
    }
}

impl FromSqlValue for f32 {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        f64::from_sql_value(value).map(|f| f as f32)
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        match value {
            SqlValue::Text(s) => Ok(s.clone()),
            SqlValue::Integer(i) => Ok(i.to_string()),
            SqlValue::Real(f) => Ok(f.to_string()),
            other => mismatch("text", other),
        }
    }
}

/// 解析带偏移的时间文本
///
/// 接受 RFC 3339 与 `YYYY-MM-DD HH:MM:SS`（视为 UTC）两种形式
fn parse_datetime(text: &str) -> std::result::Result<DateTime<FixedOffset>, ConversionError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    Err(ConversionError::Parse {
        target: "datetime",
        reason: format!("unrecognised format {:?}", text),
    })
}

impl FromSqlValue for DateTime<FixedOffset> {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        match value {
            SqlValue::Text(s) => parse_datetime(s),
            SqlValue::Integer(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| dt.fixed_offset())
                .ok_or_else(|| ConversionError::OutOfRange {
                    value: secs.to_string(),
                    target: "datetime",
                }),
            other => mismatch("datetime", other),
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        DateTime::<FixedOffset>::from_sql_value(value).map(|dt| dt.with_timezone(&Utc))
    }
}

impl FromSqlValue for serde_json::Value {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        match value {
            SqlValue::Text(s) => serde_json::from_str(s).map_err(|e| ConversionError::Parse {
                target: "json",
                reason: e.to_string(),
            }),
            SqlValue::Null => Ok(serde_json::Value::Null),
            other => mismatch("json text", other),
        }
    }
}

fn from_json_text<T: serde::de::DeserializeOwned>(
    value: &SqlValue,
) -> std::result::Result<T, ConversionError> {
    match value {
        SqlValue::Text(s) => serde_json::from_str(s).map_err(|e| ConversionError::Parse {
            target: "json container",
            reason: e.to_string(),
        }),
        other => mismatch("json text", other),
    }
}

impl<T: serde::de::DeserializeOwned> FromSqlValue for Vec<T> {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        from_json_text(value)
    }
}

impl<V: serde::de::DeserializeOwned> FromSqlValue for HashMap<String, V> {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        from_json_text(value)
    }
}

impl<V: serde::de::DeserializeOwned> FromSqlValue for BTreeMap<String, V> {
    fn from_sql_value(value: &SqlValue) -> std::result::Result<Self, ConversionError> {
        from_json_text(value)
    }
}
