//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了日志初始化功能。

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，未设置或无法解析时使用配置中的级别。
/// 全局 subscriber 只能设置一次，重复调用返回 `false`
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true));

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
