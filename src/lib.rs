//! oxstore - 写回式表缓存
//!
//! 启动时将整张表加载进按键索引的内存缓存，应用在内存中增删改，
//! 结束时把缓存整体写回：逐条upsert，并删除缓存中已不存在的行。

#![doc(html_root_url = "https://docs.rs/oxstore/0.1.0")]

extern crate self as oxstore;

pub use serde;
pub use serde::{Deserialize, Serialize};
pub use serde_json;

pub mod backend;
pub mod config;
pub mod database;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod record;
pub mod serialization;
pub mod storage;
pub mod sync;
pub mod telemetry;
pub mod utils;

// Re-export commonly used items
pub use backend::{MemoryStore, Store};
pub use config::Config;
pub use database::{Connection, Dialect, Row, SeaOrmConnection, SqlValue, SqliteConnection};
pub use error::{Result, StoreError};
pub use lifecycle::{Lifecycle, LifecycleHooks, LifecycleState, Loadable, Managed, Persistable};
pub use oxstore_macros::Record;
pub use record::{Displayed, FieldValue, HasPrimaryKey, Json, Opaque, Record, ToFieldValue};
pub use storage::SqlStorage;
pub use sync::{EmptySurvivorPolicy, PersistReport};

/// oxstore 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
