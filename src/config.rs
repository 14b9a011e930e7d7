//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了存储同步的配置结构和解析逻辑。

use crate::database::Dialect;
use crate::error::{Result, StoreError};
use crate::sync::EmptySurvivorPolicy;
use crate::utils::validate_identifier;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub config_version: Option<u32>,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 数据库配置
#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    /// 连接字符串，可能包含密码
    pub url: SecretString,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    30
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: SecretString::new(url.into_boxed_str()),
            connect_timeout_secs: default_connect_timeout(),
        }
    }

    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_url(self.url.expose_secret())
    }
}

/// 存储配置
#[derive(Deserialize, Clone, Debug)]
pub struct StorageConfig {
    /// 同步的表名
    pub table: String,
    #[serde(default)]
    pub empty_survivors: EmptySurvivorPolicy,
}

/// 日志配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LoggingConfig {
    /// 未设置 `RUST_LOG` 时使用的过滤级别
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// 从TOML文件加载并校验
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// 解析TOML文本并校验
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if let Some(version) = self.config_version {
            if version > CONFIG_VERSION {
                return Err(StoreError::Config(format!(
                    "Configuration version {} is not supported. Current version is {}.",
                    version, CONFIG_VERSION
                )));
            }
        }

        if self.database.url.expose_secret().trim().is_empty() {
            return Err(StoreError::Config("database.url cannot be empty".to_string()));
        }
        self.database.dialect()?;

        if self.database.connect_timeout_secs == 0 || self.database.connect_timeout_secs > 3600 {
            return Err(StoreError::Config(
                "database.connect_timeout_secs must be between 1 and 3600 seconds".to_string(),
            ));
        }

        validate_identifier(&self.storage.table)
            .map_err(|e| StoreError::Config(format!("storage.table: {}", e)))?;

        Ok(())
    }
}
