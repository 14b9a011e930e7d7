//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 字段值到绑定参数的强制转换。

use crate::database::value::SqlValue;
use crate::record::FieldValue;
use crate::serialization::{JsonSerializer, OpaqueCodec};
use tracing::warn;

/// 时间值的文本格式（ATOM）
pub const TEMPORAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// 将字段值转换为可绑定的标量
///
/// 匹配顺序：时间、字符串转换能力、标量、空值、容器、其他结构化值，
/// 其余一律为空值。同一输入总是得到同一输出。
pub fn coerce(value: &FieldValue) -> SqlValue {
    match value {
        FieldValue::Temporal(dt) => SqlValue::Text(dt.format(TEMPORAL_FORMAT).to_string()),
        FieldValue::Stringable(display) => SqlValue::Text(display.to_string()),
        FieldValue::Bool(b) => SqlValue::Bool(*b),
        FieldValue::Integer(i) => SqlValue::Integer(*i),
        FieldValue::Float(f) => SqlValue::Real(*f),
        FieldValue::Text(s) => SqlValue::Text(s.clone()),
        FieldValue::Null => SqlValue::Null,
        FieldValue::Container(serde_json::Value::Null) => SqlValue::Null,
        FieldValue::Container(json) => SqlValue::Text(JsonSerializer::new().value_to_text(json)),
        FieldValue::Opaque { type_name, payload } => {
            SqlValue::Text(OpaqueCodec::new().encode_captured(type_name, payload))
        }
        FieldValue::Unsupported(type_name) => {
            warn!("Binding NULL for unsupported value of type {}", type_name);
            SqlValue::Null
        }
    }
}

/// 按列顺序取出并转换记录的字段，缺失的列绑定为空
pub fn coerce_fields(fields: &[(String, FieldValue)], columns: &[String]) -> Vec<SqlValue> {
    columns
        .iter()
        .map(|column| {
            fields
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| coerce(value))
                .unwrap_or(SqlValue::Null)
        })
        .collect()
}
