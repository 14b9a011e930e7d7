//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了与单张数据表同步的存储对象。

use crate::backend::{MemoryStore, Store};
use crate::config::Config;
use crate::database::{self, Connection, TableName};
use crate::error::Result;
use crate::lifecycle::{Lifecycle, LifecycleHooks, Loadable, Persistable};
use crate::record::Record;
use crate::sync::{self, EmptySurvivorPolicy, PersistReport};
use std::marker::PhantomData;
use tracing::debug;

/// 写回式存储
///
/// 内存缓存以字符串键保存记录，`load` 从表中填充，`persist` 将缓存整体写回。
/// 不可跨线程共享，调用方负责串行访问
pub struct SqlStorage<R, C = Box<dyn Connection>> {
    conn: C,
    table: TableName,
    store: MemoryStore<R>,
    empty_survivors: EmptySurvivorPolicy,
    hooks: LifecycleHooks<Self>,
    // !Sync
    _not_sync: PhantomData<std::cell::Cell<()>>,
}

impl<R: Record, C: Connection> SqlStorage<R, C> {
    pub fn new(conn: C, table: impl Into<String>) -> Result<Self> {
        let table = TableName::new(table)?;
        debug!("SqlStorage created for table {} ({})", table, conn.dialect());
        Ok(Self {
            conn,
            table,
            store: MemoryStore::new(),
            empty_survivors: EmptySurvivorPolicy::default(),
            hooks: LifecycleHooks::new(),
            _not_sync: PhantomData,
        })
    }

    pub fn with_empty_survivor_policy(mut self, policy: EmptySurvivorPolicy) -> Self {
        self.empty_survivors = policy;
        self
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn empty_survivor_policy(&self) -> EmptySurvivorPolicy {
        self.empty_survivors
    }

    pub fn cache(&self) -> &MemoryStore<R> {
        &self.store
    }
}

impl<R: Record> SqlStorage<R, Box<dyn Connection>> {
    /// 按配置建立连接并构造
    pub fn open(config: &Config) -> Result<Self> {
        let conn = database::connect(&config.database)?;
        Ok(Self::new(conn, config.storage.table.clone())?
            .with_empty_survivor_policy(config.storage.empty_survivors))
    }
}

impl<R: Record, C: Connection> Store<R> for SqlStorage<R, C> {
    fn save(&mut self, key: impl Into<String>, record: R) {
        self.store.save(key, record);
    }

    fn find(&self, key: &str) -> Option<&R> {
        self.store.find(key)
    }

    fn find_all(&self) -> Vec<&R> {
        self.store.find_all()
    }

    fn remove(&mut self, key: &str) -> Option<R> {
        self.store.remove(key)
    }

    fn count(&self) -> usize {
        self.store.count()
    }

    fn clear(&mut self) {
        self.store.clear();
    }
}

impl<R: Record, C: Connection> Loadable for SqlStorage<R, C> {
    fn load(&mut self) -> Result<usize> {
        sync::load(&self.conn, &self.table, &mut self.store)
    }
}

impl<R: Record, C: Connection> Persistable for SqlStorage<R, C> {
    fn persist(&mut self) -> Result<PersistReport> {
        sync::persist(
            &self.conn,
            &self.table,
            &mut self.store,
            self.empty_survivors,
        )
    }
}

impl<R: Record, C: Connection> Lifecycle for SqlStorage<R, C> {
    fn hooks(&self) -> LifecycleHooks<Self> {
        self.hooks
    }
}
