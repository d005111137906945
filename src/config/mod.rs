// ==========================================
// 库存对账同步 - 配置层
// ==========================================
// 职责: 远端凭据、批次节奏、重试与日志格式
// 来源: 内嵌默认值 → TOML 文件 → 环境变量
// ==========================================

pub mod sync_config;

pub use sync_config::{
    env_keys, load_config, ConfigError, LogFormat, LoggingSettings, RetrySettings,
    ShopifyConfig, SyncConfig, SyncSettings,
};
