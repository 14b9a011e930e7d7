//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 不透明对象的持久文本编码。
//!
//! 编码格式为 `<类型名>:<JSON负载>`。类型名取自 `std::any::type_name`，
//! 只在同一构建产物内稳定，因此编码只保证在同一运行时内可往返。

use super::{JsonSerializer, TextSerializer};
use crate::error::{Result, StoreError};
use serde::{de::DeserializeOwned, Serialize};

/// 不透明对象编解码器
#[derive(Clone, Copy, Debug, Default)]
pub struct OpaqueCodec {
    json: JsonSerializer,
}

impl OpaqueCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将类型名与已捕获的负载编码为文本
    pub fn encode_captured(&self, type_name: &str, payload: &serde_json::Value) -> String {
        format!("{}:{}", type_name, self.json.value_to_text(payload))
    }

    /// 直接编码一个值
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<String> {
        let payload = self.json.to_text(value)?;
        Ok(format!("{}:{}", std::any::type_name::<T>(), payload))
    }

    /// 解码文本，类型名必须与目标类型一致
    pub fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        let expected = std::any::type_name::<T>();
        let payload = text
            .strip_prefix(expected)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| {
                StoreError::Serialization(format!(
                    "opaque value is not an encoded {}",
                    expected
                ))
            })?;
        self.json.from_text(payload)
    }
}
