//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 记录模型
//!
//! 一条记录对应表中的一行：字段名与列名一一对应，约定其中一个字段为 `id`。
//! 通常通过 `#[derive(Record)]` 实现，也可以手写。

pub mod field;

use crate::database::value::Row;
use crate::error::Result;
use std::fmt;

pub use field::{Displayed, FieldValue, Json, Opaque, ToFieldValue};

/// 主键推导能力
///
/// 实现该特征的记录以其返回值作为缓存键，优先于 `id` 字段
pub trait HasPrimaryKey {
    type Key: fmt::Display;

    fn primary_key(&self) -> Self::Key;
}

/// 可与表行互相转换的记录
pub trait Record: Sized {
    /// 从结果行构造记录
    fn from_row(row: &Row) -> Result<Self>;

    /// 按声明顺序返回 (字段名, 字段值)
    fn fields(&self) -> Vec<(String, FieldValue)>;

    /// 按名称取单个字段
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields()
            .into_iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, value)| value)
    }

    /// 主键推导能力的出口
    ///
    /// 默认不具备该能力；`#[record(primary_key)]` 会委托给 [`HasPrimaryKey`]
    fn derived_key(&self) -> Option<String> {
        None
    }
}
