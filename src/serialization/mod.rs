//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了字段值的文本序列化机制，供值强转时编码容器与不透明对象。

pub mod json;
pub mod opaque;

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

pub use json::JsonSerializer;
pub use opaque::OpaqueCodec;

/// 文本序列化器特征
///
/// 绑定到表列的值只能是标量，因此结构化值统一编码为文本
pub trait TextSerializer {
    /// 序列化值为文本
    fn to_text<T: Serialize + ?Sized>(&self, value: &T) -> Result<String>;

    /// 从文本反序列化值
    fn from_text<T: DeserializeOwned>(&self, text: &str) -> Result<T>;
}
