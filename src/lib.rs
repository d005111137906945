// ==========================================
// 库存对账同步 - 核心库
// ==========================================
// 职责: 库存表格 → 远端商品库存对账
// 流程: 文件解析 → 去重/聚合 → 变体/位置解析 → 分批比对与写入 → 三桶汇总
// 约束: 每次运行无状态，不做持久化
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 行记录、目录值类型、汇总
pub mod domain;

// 导入层 - 表格解析与数量推导
pub mod importer;

// 引擎层 - 解析与同步
pub mod engine;

// 网关层 - 远端商品目录
pub mod gateway;

// 配置层
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{load_config, SyncConfig};
pub use domain::{ParsedRow, QuantitySource, ResultRow, RunReport, Summary};
pub use engine::{SyncError, SyncExecutor, SyncOptions};
pub use gateway::{CatalogGateway, GatewayError, ShopifyGateway};
pub use importer::{ImportError, RowImporter};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "inventory-sync";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
