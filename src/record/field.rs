//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录字段值的封闭变体集合，以及从Rust类型到字段值的转换。

use crate::database::value::{FromSqlValue, SqlValue};
use crate::error::ConversionError;
use crate::serialization::{JsonSerializer, OpaqueCodec, TextSerializer};
use chrono::{DateTime, FixedOffset, Offset, TimeZone};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// 记录字段值
///
/// 值强转按变体声明顺序匹配：时间、可字符串化、标量、空值、容器、不透明对象、其他
#[derive(Clone)]
pub enum FieldValue {
    /// 带时区偏移的时间
    Temporal(DateTime<FixedOffset>),
    /// 具备字符串转换能力的值，强转时才调用其 `Display`
    Stringable(Arc<dyn fmt::Display + Send + Sync>),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
    /// 有序或键值容器，以JSON文档形式捕获
    Container(serde_json::Value),
    /// 其他结构化值
    Opaque {
        type_name: &'static str,
        payload: serde_json::Value,
    },
    /// 无法捕获的值（如序列化失败），强转为空
    Unsupported(&'static str),
}

impl FieldValue {
    /// 包装一个具备 `Display` 能力的值
    pub fn stringable<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        FieldValue::Stringable(Arc::new(value))
    }

    /// 以JSON文档捕获容器
    pub fn container<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => FieldValue::Container(json),
            Err(e) => {
                warn!(
                    "Cannot capture {} as a container: {}",
                    std::any::type_name::<T>(),
                    e
                );
                FieldValue::Unsupported(std::any::type_name::<T>())
            }
        }
    }

    /// 捕获不透明对象
    pub fn opaque<T: Serialize>(value: &T) -> Self {
        let type_name = std::any::type_name::<T>();
        match serde_json::to_value(value) {
            Ok(payload) => FieldValue::Opaque { type_name, payload },
            Err(e) => {
                warn!("Cannot capture {} as an opaque value: {}", type_name, e);
                FieldValue::Unsupported(type_name)
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Temporal(dt) => f.debug_tuple("Temporal").field(dt).finish(),
            FieldValue::Stringable(s) => f
                .debug_tuple("Stringable")
                .field(&s.to_string())
                .finish(),
            FieldValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            FieldValue::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            FieldValue::Float(x) => f.debug_tuple("Float").field(x).finish(),
            FieldValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            FieldValue::Null => write!(f, "Null"),
            FieldValue::Container(v) => f.debug_tuple("Container").field(v).finish(),
            FieldValue::Opaque { type_name, payload } => f
                .debug_struct("Opaque")
                .field("type_name", type_name)
                .field("payload", payload)
                .finish(),
            FieldValue::Unsupported(t) => f.debug_tuple("Unsupported").field(t).finish(),
        }
    }
}

/// 转换为字段值
pub trait ToFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

impl<T: ToFieldValue + ?Sized> ToFieldValue for &T {
    fn to_field_value(&self) -> FieldValue {
        (**self).to_field_value()
    }
}

impl ToFieldValue for FieldValue {
    fn to_field_value(&self) -> FieldValue {
        self.clone()
    }
}

impl ToFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
}

macro_rules! impl_to_field_int {
    ($($ty:ty),*) => {
        $(
            impl ToFieldValue for $ty {
                fn to_field_value(&self) -> FieldValue {
                    FieldValue::Integer(i64::from(*self))
                }
            }
        )*
    };
}

impl_to_field_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_to_field_wide_uint {
    ($($ty:ty),*) => {
        $(
            impl ToFieldValue for $ty {
                fn to_field_value(&self) -> FieldValue {
                    // 超出 i64 的值以十进制文本落库
                    match i64::try_from(*self) {
                        Ok(i) => FieldValue::Integer(i),
                        Err(_) => FieldValue::Text(self.to_string()),
                    }
                }
            }
        )*
    };
}

impl_to_field_wide_uint!(u64, usize);

impl ToFieldValue for f32 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(f64::from(*self))
    }
}

impl ToFieldValue for f64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }
}

impl ToFieldValue for str {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.to_string())
    }
}

impl ToFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
}

impl<T: ToFieldValue> ToFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(value) => value.to_field_value(),
            None => FieldValue::Null,
        }
    }
}

impl<Tz: TimeZone> ToFieldValue for DateTime<Tz> {
    fn to_field_value(&self) -> FieldValue {
        let offset = self.offset().fix();
        FieldValue::Temporal(self.with_timezone(&offset))
    }
}

impl<T: Serialize> ToFieldValue for Vec<T> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::container(self)
    }
}

impl<V: Serialize> ToFieldValue for HashMap<String, V> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::container(self)
    }
}

impl<V: Serialize> ToFieldValue for BTreeMap<String, V> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::container(self)
    }
}

impl ToFieldValue for serde_json::Value {
    fn to_field_value(&self) -> FieldValue {
        match self {
            serde_json::Value::Null => FieldValue::Null,
            other => FieldValue::Container(other.clone()),
        }
    }
}

macro_rules! transparent_wrapper {
    ($name:ident) => {
        impl<T> $name<T> {
            pub fn new(value: T) -> Self {
                Self(value)
            }

            pub fn into_inner(self) -> T {
                self.0
            }
        }

        impl<T> Deref for $name<T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.0
            }
        }

        impl<T> DerefMut for $name<T> {
            fn deref_mut(&mut self) -> &mut T {
                &mut self.0
            }
        }

        impl<T> From<T> for $name<T> {
            fn from(value: T) -> Self {
                Self(value)
            }
        }
    };
}

/// 以JSON容器落库的字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Json<T>(pub T);

/// 以不透明编码落库的字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Opaque<T>(pub T);

/// 以字符串形式落库的字段，读回时经 `FromStr` 解析
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Displayed<T>(pub T);

transparent_wrapper!(Json);
transparent_wrapper!(Opaque);
transparent_wrapper!(Displayed);

impl<T: Serialize> ToFieldValue for Json<T> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::container(&self.0)
    }
}

impl<T: Serialize> ToFieldValue for Opaque<T> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::opaque(&self.0)
    }
}

impl<T> ToFieldValue for Displayed<T>
where
    T: fmt::Display + Clone + Send + Sync + 'static,
{
    fn to_field_value(&self) -> FieldValue {
        FieldValue::stringable(self.0.clone())
    }
}

fn expect_text<'a>(value: &'a SqlValue, expected: &'static str) -> Result<&'a str, ConversionError> {
    match value {
        SqlValue::Text(s) => Ok(s),
        other => Err(ConversionError::TypeMismatch {
            expected,
            found: other.type_name(),
        }),
    }
}

impl<T: DeserializeOwned> FromSqlValue for Json<T> {
    fn from_sql_value(value: &SqlValue) -> Result<Self, ConversionError> {
        if value.is_null() {
            return serde_json::from_value(serde_json::Value::Null)
                .map(Json)
                .map_err(|e| ConversionError::Parse {
                    target: std::any::type_name::<T>(),
                    reason: e.to_string(),
                });
        }
        let text = expect_text(value, "json text")?;
        JsonSerializer::new()
            .from_text(text)
            .map(Json)
            .map_err(|e| ConversionError::Parse {
                target: std::any::type_name::<T>(),
                reason: e.to_string(),
            })
    }
}

impl<T: DeserializeOwned> FromSqlValue for Opaque<T> {
    fn from_sql_value(value: &SqlValue) -> Result<Self, ConversionError> {
        let text = expect_text(value, "opaque text")?;
        OpaqueCodec::new()
            .decode(text)
            .map(Opaque)
            .map_err(|e| ConversionError::Parse {
                target: std::any::type_name::<T>(),
                reason: e.to_string(),
            })
    }
}

impl<T> FromSqlValue for Displayed<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn from_sql_value(value: &SqlValue) -> Result<Self, ConversionError> {
        let text = match value {
            SqlValue::Text(s) => s.clone(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            other => {
                return Err(ConversionError::TypeMismatch {
                    expected: "text",
                    found: other.type_name(),
                })
            }
        };
        text.parse().map(Displayed).map_err(|e: T::Err| ConversionError::Parse {
            target: std::any::type_name::<T>(),
            reason: e.to_string(),
        })
    }
}
