//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了存储对象的生命周期钩子与托管容器。
//!
//! 存储对象在构造时绑定两个钩子：`on_init` 加载整表，`on_destroy` 写回缓存。
//! [`Managed`] 负责在使用前调用前者，并在生命周期结束时恰好调用一次后者。

use crate::error::Result;
use crate::sync::PersistReport;
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::{error, info, warn};

/// 可从数据源加载
pub trait Loadable {
    /// 加载全部记录，返回记录数
    fn load(&mut self) -> Result<usize>;
}

/// 可写回数据源
pub trait Persistable {
    fn persist(&mut self) -> Result<PersistReport>;
}

/// 生命周期钩子
pub struct LifecycleHooks<S> {
    pub on_init: fn(&mut S) -> Result<usize>,
    pub on_destroy: fn(&mut S) -> Result<PersistReport>,
}

impl<S: Loadable + Persistable> LifecycleHooks<S> {
    /// 绑定到 `load` / `persist`
    pub fn new() -> Self {
        Self {
            on_init: <S as Loadable>::load,
            on_destroy: <S as Persistable>::persist,
        }
    }
}

impl<S: Loadable + Persistable> Default for LifecycleHooks<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for LifecycleHooks<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for LifecycleHooks<S> {}

impl<S> fmt::Debug for LifecycleHooks<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks").finish_non_exhaustive()
    }
}

/// 暴露生命周期钩子的存储对象
pub trait Lifecycle: Sized {
    fn hooks(&self) -> LifecycleHooks<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotInitialized,
    Initialized,
    Persisted,
}

/// 托管容器
///
/// 已初始化的对象在 [`Managed::shutdown`] 或 `Drop` 时写回，二者只会生效一次。
/// `Drop` 路径上的错误只能记录日志，需要处理错误时应显式调用 `shutdown`
pub struct Managed<S: Lifecycle> {
    storage: S,
    hooks: LifecycleHooks<S>,
    state: LifecycleState,
}

impl<S: Lifecycle> Managed<S> {
    /// 包装存储对象，尚未初始化
    pub fn new(storage: S) -> Self {
        let hooks = storage.hooks();
        Self {
            storage,
            hooks,
            state: LifecycleState::NotInitialized,
        }
    }

    /// 包装并立即初始化
    ///
    /// 初始化失败时对象被丢弃且不会写回
    pub fn start(storage: S) -> Result<Self> {
        let mut managed = Self::new(storage);
        managed.init()?;
        Ok(managed)
    }

    /// 调用 `on_init`，只在未初始化状态下生效
    pub fn init(&mut self) -> Result<usize> {
        if self.state != LifecycleState::NotInitialized {
            warn!("on_init skipped, state is {:?}", self.state);
            return Ok(0);
        }
        let loaded = (self.hooks.on_init)(&mut self.storage)?;
        self.state = LifecycleState::Initialized;
        info!("存储已初始化，加载 {} 条记录", loaded);
        Ok(loaded)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// 写回并结束生命周期
    pub fn shutdown(mut self) -> Result<PersistReport> {
        self.destroy()
    }

    fn destroy(&mut self) -> Result<PersistReport> {
        if self.state != LifecycleState::Initialized {
            return Ok(PersistReport::skipped());
        }
        self.state = LifecycleState::Persisted;
        let report = (self.hooks.on_destroy)(&mut self.storage)?;
        info!(
            "存储已写回: upserted={}, deleted={}",
            report.upserted, report.deleted
        );
        Ok(report)
    }
}

impl<S: Lifecycle> Deref for Managed<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.storage
    }
}

impl<S: Lifecycle> DerefMut for Managed<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

impl<S: Lifecycle> Drop for Managed<S> {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            error!("Failed to persist storage on drop: {}", e);
        }
    }
}
