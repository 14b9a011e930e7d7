//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存与数据表之间的同步机制，包括键推导、值转换、加载与持久化。

pub mod coercion;
pub mod key;
pub mod loader;
pub mod synchronizer;

pub use coercion::{coerce, coerce_fields, TEMPORAL_FORMAT};
pub use key::{resolve_key, KeyStrategy};
pub use loader::load;
pub use synchronizer::{persist, EmptySurvivorPolicy, PersistReport};
