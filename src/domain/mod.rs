// ==========================================
// 库存对账同步 - 领域模型层
// ==========================================
// 职责: 定义行记录、远端目录值对象、汇总结构
// 红线: 不含远端访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod identity;
pub mod row;
pub mod summary;
pub mod types;

// 重导出核心类型
pub use catalog::{
    Location, ProductCandidate, ResolvedVariant, SelectedOption, VariantNode, VariantResolution,
};
pub use identity::{GroupKey, IdentityKey};
pub use row::{ParsedRow, ResultRow, RowIdentifiers};
pub use summary::{RowOutcome, RunReport, Summary};
pub use types::QuantitySource;
