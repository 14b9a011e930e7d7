//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 统一工具模块
//!
//! 提供SQL标识符校验与日志脱敏等公共函数

pub mod redaction;

use crate::error::{Result, StoreError};
use lazy_static::lazy_static;
use regex::Regex;

/// 标识符最大长度（与MySQL保持一致）
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

lazy_static! {
    static ref IDENTIFIER_PATTERN: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid");
}

/// 验证SQL标识符是否安全（防止SQL注入）
///
/// 表名与列名都会被拼接进语句文本，只允许字母、数字、下划线，且不能以数字开头
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(StoreError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(StoreError::InvalidIdentifier(format!(
            "'{}' exceeds maximum length of {} characters",
            identifier, MAX_IDENTIFIER_LENGTH
        )));
    }

    if !IDENTIFIER_PATTERN.is_match(identifier) {
        return Err(StoreError::InvalidIdentifier(format!(
            "'{}': must start with a letter or underscore and contain only alphanumeric characters and underscores",
            identifier
        )));
    }

    Ok(())
}
