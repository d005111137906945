// ==========================================
// 库存对账同步 - 引擎层
// ==========================================
// 职责: 变体解析、位置解析、分批执行与逐行同步
// 红线: 引擎只通过 CatalogGateway 访问远端，所有失败必须输出 reason
// ==========================================

pub mod batch;
pub mod location_resolver;
pub mod sync_executor;
pub mod title_matcher;
pub mod variant_resolver;

pub use batch::{BatchProgress, BatchRunner, ProgressObserver, SyncPhase, TracingProgressObserver};
pub use location_resolver::{LocationResolution, LocationResolver};
pub use sync_executor::{SyncError, SyncExecutor, SyncOptions};
pub use title_matcher::{pick_best, title_score, TitleMatch};
pub use variant_resolver::{
    ExactField, ExactLookupStrategy, FuzzyTitleStrategy, HandleStrategy, StrategyOutcome,
    VariantResolver, VariantStrategy,
};
