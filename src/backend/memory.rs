//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于内存的有序缓存实现。

use super::Store;
use ahash::AHashMap;
use tracing::debug;

/// 内存缓存
///
/// 条目按首次插入顺序保存，索引记录键到位置的映射。
/// 删除只留下空槽，空槽过半时整体压缩
#[derive(Debug, Clone)]
pub struct MemoryStore<R> {
    entries: Vec<Option<(String, R)>>,
    index: AHashMap<String, usize>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }
}

impl<R> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按插入顺序返回所有键
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().flatten().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
        self.entries
            .iter()
            .flatten()
            .map(|(key, record)| (key.as_str(), record))
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut R> {
        let position = *self.index.get(key)?;
        self.entries[position].as_mut().map(|(_, record)| record)
    }

    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        for (position, (key, _)) in self.entries.iter().flatten().enumerate() {
            if let Some(slot) = self.index.get_mut(key) {
                *slot = position;
            }
        }
        debug!("MemoryStore compacted to {} entries", self.entries.len());
    }
}

impl<R> Store<R> for MemoryStore<R> {
    fn save(&mut self, key: impl Into<String>, record: R) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&position) => {
                debug!("MemoryStore save: key={}, replaced=true", key);
                self.entries[position] = Some((key, record));
            }
            None => {
                debug!("MemoryStore save: key={}, replaced=false", key);
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(Some((key, record)));
            }
        }
    }

    fn find(&self, key: &str) -> Option<&R> {
        let position = *self.index.get(key)?;
        self.entries[position].as_ref().map(|(_, record)| record)
    }

    fn find_all(&self) -> Vec<&R> {
        self.entries.iter().flatten().map(|(_, record)| record).collect()
    }

    fn remove(&mut self, key: &str) -> Option<R> {
        let position = self.index.remove(key)?;
        let (_, record) = self.entries[position].take()?;
        debug!("MemoryStore remove: key={}", key);
        if self.entries.len() > 2 * self.index.len() {
            self.compact();
        }
        Some(record)
    }

    fn count(&self) -> usize {
        self.index.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}
