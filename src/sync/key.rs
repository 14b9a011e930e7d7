//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 缓存键推导。

use super::coercion::coerce;
use crate::database::ID_COLUMN;
use crate::record::Record;

/// 键推导策略，按 [`KEY_STRATEGIES`] 的顺序依次尝试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// 记录自身的主键推导能力
    PrimaryKey,
    /// `id` 字段的文本形式
    IdField,
}

pub const KEY_STRATEGIES: [KeyStrategy; 2] = [KeyStrategy::PrimaryKey, KeyStrategy::IdField];

impl KeyStrategy {
    pub fn derive<R: Record>(&self, record: &R) -> Option<String> {
        match self {
            KeyStrategy::PrimaryKey => record.derived_key(),
            KeyStrategy::IdField => record
                .field(ID_COLUMN)
                .map(|value| coerce(&value).to_key_string()),
        }
    }
}

/// 计算记录的缓存键
///
/// 所有策略都不适用时返回空串
pub fn resolve_key<R: Record>(record: &R) -> String {
    KEY_STRATEGIES
        .iter()
        .find_map(|strategy| strategy.derive(record))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::value::Row;
    use crate::error::Result;
    use crate::record::{FieldValue, ToFieldValue};

    struct WithCapability {
        id: i64,
        sku: String,
    }

    impl Record for WithCapability {
        fn from_row(row: &Row) -> Result<Self> {
            Ok(Self {
                id: row.get("id")?,
                sku: row.get("sku")?,
            })
        }

        fn fields(&self) -> Vec<(String, FieldValue)> {
            vec![
                ("id".into(), self.id.to_field_value()),
                ("sku".into(), self.sku.to_field_value()),
            ]
        }

        fn derived_key(&self) -> Option<String> {
            Some(format!("sku-{}", self.sku))
        }
    }

    struct WithId<T: ToFieldValue>(T);

    impl<T: ToFieldValue> Record for WithId<T> {
        fn from_row(_row: &Row) -> Result<Self> {
            unimplemented!()
        }

        fn fields(&self) -> Vec<(String, FieldValue)> {
            vec![("id".into(), self.0.to_field_value())]
        }
    }

    struct Keyless;

    impl Record for Keyless {
        fn from_row(_row: &Row) -> Result<Self> {
            Ok(Keyless)
        }

        fn fields(&self) -> Vec<(String, FieldValue)> {
            vec![("name".into(), "x".to_field_value())]
        }
    }

    #[test]
    fn test_capability_wins_over_id_field() {
        let record = WithCapability {
            id: 7,
            sku: "A1".into(),
        };
        assert_eq!(resolve_key(&record), "sku-A1");
    }

    #[test]
    fn test_id_field_is_stringified() {
        assert_eq!(resolve_key(&WithId(42i64)), "42");
        assert_eq!(resolve_key(&WithId("abc")), "abc");
        assert_eq!(resolve_key(&WithId(1.5f64)), "1.5");
        assert_eq!(resolve_key(&WithId(true)), "1");
        assert_eq!(resolve_key(&WithId(false)), "");
        assert_eq!(resolve_key(&WithId(None::<i64>)), "");
    }

    #[test]
    fn test_no_capability_and_no_id_is_empty() {
        assert_eq!(resolve_key(&Keyless), "");
    }

    #[test]
    fn test_strategy_order() {
        let record = WithCapability {
            id: 7,
            sku: "A1".into(),
        };
        assert_eq!(KeyStrategy::IdField.derive(&record).as_deref(), Some("7"));
        assert_eq!(KeyStrategy::PrimaryKey.derive(&Keyless), None);
    }
}
