// ==========================================
// 库存对账同步 - 远端网关层
// ==========================================
// 职责: 商品目录查询、库存读取与写入
// 约束: 引擎只依赖 CatalogGateway trait，测试使用内存实现
// ==========================================

pub mod catalog_gateway;
pub mod error;
pub mod retry;
pub mod shopify;

pub use catalog_gateway::CatalogGateway;
pub use error::{GatewayError, GatewayResult};
pub use retry::RetryPolicy;
pub use shopify::ShopifyGateway;
