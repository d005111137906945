// ==========================================
// 库存对账同步 - 运行配置
// ==========================================
// 加载顺序（后者覆盖前者）:
// 1. 内嵌默认配置
// 2. 配置文件：显式路径 → ./inventory-sync.toml → <配置目录>/inventory-sync/config.toml
// 3. 环境变量
// ==========================================

use crate::gateway::retry::RetryPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 内嵌默认配置
const DEFAULT_CONFIG: &str = r#"
[shopify]
shop_domain = ""
access_token = ""
api_version = "2024-10"

[sync]
batch_size = 5
batch_delay_ms = 1000
fuzzy_candidate_limit = 10
dry_run = false

[retry]
max_attempts = 5
base_delay_ms = 1000

[logging]
format = "text"
"#;

pub const LOCAL_CONFIG_FILE: &str = "inventory-sync.toml";

// ==========================================
// 配置键（环境变量）
// ==========================================
pub mod env_keys {
    pub const SHOP_DOMAIN: &str = "SHOPIFY_SHOP_DOMAIN";
    pub const ACCESS_TOKEN: &str = "SHOPIFY_ACCESS_TOKEN";
    pub const API_VERSION: &str = "SHOPIFY_API_VERSION";
    pub const DEFAULT_LOCATION: &str = "SYNC_DEFAULT_LOCATION";
    pub const BATCH_SIZE: &str = "SYNC_BATCH_SIZE";
    pub const BATCH_DELAY_MS: &str = "SYNC_BATCH_DELAY_MS";
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件格式错误: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ValueError {
        key: String,
        value: String,
        message: String,
    },

    #[error("缺少远端凭据: {0}")]
    MissingCredential(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub shopify: ShopifyConfig,
    pub sync: SyncSettings,
    pub retry: RetrySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// 实际加载的配置文件（None = 内嵌默认）
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyConfig {
    #[serde(default)]
    pub shop_domain: String,
    #[serde(default)]
    pub access_token: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    #[serde(default)]
    pub default_location_name: Option<String>,
    pub fuzzy_candidate_limit: usize,
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncSettings {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for SyncConfig {
    fn default() -> Self {
        // 内嵌配置在测试中校验可解析
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|_| SyncConfig {
            shopify: ShopifyConfig {
                shop_domain: String::new(),
                access_token: String::new(),
                api_version: "2024-10".to_string(),
            },
            sync: SyncSettings {
                batch_size: 5,
                batch_delay_ms: 1000,
                default_location_name: None,
                fuzzy_candidate_limit: 10,
                dry_run: false,
            },
            retry: RetrySettings {
                max_attempts: 5,
                base_delay_ms: 1000,
            },
            logging: LoggingSettings::default(),
            source: None,
        })
    }
}

impl SyncConfig {
    /// 从 TOML 文本解析（缺失的段落/键回落到默认值）
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let mut merged: toml::Table = toml::from_str(DEFAULT_CONFIG)?;
        let overrides: toml::Table = toml::from_str(contents)?;
        merge_tables(&mut merged, overrides);
        Ok(toml::Value::Table(merged).try_into()?)
    }

    /// 应用环境变量覆盖
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(env_keys::SHOP_DOMAIN) {
            self.shopify.shop_domain = v;
        }
        if let Some(v) = lookup(env_keys::ACCESS_TOKEN) {
            self.shopify.access_token = v;
        }
        if let Some(v) = lookup(env_keys::API_VERSION) {
            self.shopify.api_version = v;
        }
        if let Some(v) = lookup(env_keys::DEFAULT_LOCATION) {
            self.sync.default_location_name = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup(env_keys::BATCH_SIZE) {
            self.sync.batch_size = parse_env(env_keys::BATCH_SIZE, &v)?;
        }
        if let Some(v) = lookup(env_keys::BATCH_DELAY_MS) {
            self.sync.batch_delay_ms = parse_env(env_keys::BATCH_DELAY_MS, &v)?;
        }
        Ok(())
    }

    /// 校验运行参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.batch_size == 0 {
            return Err(ConfigError::ValueError {
                key: "sync.batch_size".to_string(),
                value: "0".to_string(),
                message: "批次大小必须大于 0".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValueError {
                key: "retry.max_attempts".to_string(),
                value: "0".to_string(),
                message: "最大尝试次数必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 远端凭据检查（逐行处理开始前执行）
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        if self.shopify.shop_domain.trim().is_empty() {
            return Err(ConfigError::MissingCredential(
                "shopify.shop_domain".to_string(),
            ));
        }
        if self.shopify.access_token.trim().is_empty() {
            return Err(ConfigError::MissingCredential(
                "shopify.access_token".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::ValueError {
        key: key.to_string(),
        value: value.to_string(),
        message: e.to_string(),
    })
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested)
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// 默认配置文件候选路径
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("inventory-sync").join("config.toml"));
    }
    paths
}

/// 加载配置
///
/// # 参数
/// - explicit: 显式指定的配置文件（必须存在）
pub fn load_config(explicit: Option<&Path>) -> Result<SyncConfig, ConfigError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => candidate_paths().into_iter().find(|p| p.exists()),
    };

    let mut config = match &path {
        Some(path) => {
            let contents =
                std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            SyncConfig::from_toml(&contents)?
        }
        None => SyncConfig::from_toml("")?,
    };
    config.source = path;

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}
