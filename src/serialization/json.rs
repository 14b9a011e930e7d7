//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了JSON文本序列化器的实现。

use super::TextSerializer;
use crate::error::{Result, StoreError};
use serde::{de::DeserializeOwned, Serialize};

/// JSON序列化器
///
/// 有序/键值容器以紧凑JSON文本落库
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }

    /// 序列化已捕获的JSON值
    ///
    /// `serde_json::Value` 的映射按键排序，因此输出是确定的
    pub fn value_to_text(&self, value: &serde_json::Value) -> String {
        value.to_string()
    }
}

impl TextSerializer for JsonSerializer {
    fn to_text<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn from_text<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        serde_json::from_str(text).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
