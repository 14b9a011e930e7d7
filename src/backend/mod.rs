//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了按键存取记录的缓存后端。

pub mod memory;

pub use memory::MemoryStore;

/// 以字符串为键的记录缓存
///
/// 键唯一；`find_all` 按插入顺序返回
pub trait Store<R> {
    /// 保存记录，已存在的键原位替换
    fn save(&mut self, key: impl Into<String>, record: R);

    fn find(&self, key: &str) -> Option<&R>;

    fn find_all(&self) -> Vec<&R>;

    fn remove(&mut self, key: &str) -> Option<R>;

    fn count(&self) -> usize;

    fn clear(&mut self);

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }
}
