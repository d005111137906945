// ==========================================
// 库存对账同步 - 领域类型定义
// ==========================================
// 职责: 数量来源标记（provenance）
// 序列化格式: snake_case（与上传接口 JSON 契约一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 数量来源 (Quantity Source)
// ==========================================
// 记录目标数量由哪条规则得出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantitySource {
    ClosingStockDirect,            // 期末库存直取
    OpeningPlusMovement,           // 期初 + 变动
    OpeningPlusInwardMinusOutward, // 期初 + 入库 - 出库
    OpeningStockFallback,          // 仅期初
    MissingStockFields,            // 无可用库存字段
    AggregatedFromBins,            // 多库位合并
}

impl QuantitySource {
    /// 转换为字符串标识（与 JSON 值一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantitySource::ClosingStockDirect => "closing_stock_direct",
            QuantitySource::OpeningPlusMovement => "opening_plus_movement",
            QuantitySource::OpeningPlusInwardMinusOutward => "opening_plus_inward_minus_outward",
            QuantitySource::OpeningStockFallback => "opening_stock_fallback",
            QuantitySource::MissingStockFields => "missing_stock_fields",
            QuantitySource::AggregatedFromBins => "aggregated_from_bins",
        }
    }
}

impl fmt::Display for QuantitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
