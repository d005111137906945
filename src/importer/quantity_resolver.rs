// ==========================================
// 库存对账同步 - 目标数量派生
// ==========================================
// 职责: 按 4 条数据源规则级联计算目标数量，首个命中即返回
// 规则:
// 1. 期末库存可解析 → max(0, round(closing))
// 2. 期初 + 变动均可解析 → max(0, round(opening + movement))
// 3. 期初 + (入库 或 出库) → max(0, round(opening + inward - outward))，缺失项按 0
// 4. 仅期初 → max(0, round(opening))
// 5. 其他 → 无数量（missing_stock_fields）
// ==========================================

use crate::domain::QuantitySource;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::file_parser::RawRecord;
use crate::importer::row_importer_trait::QuantityResolverTrait;

// 各字段族的列名别名（按优先级）
pub const CLOSING_STOCK_ALIASES: &[&str] = &[
    "ClosingStock",
    "Closing Stock",
    "Closing Qty",
    "Closing Quantity",
    "Closing Balance",
    "Quantity",
    "Qty",
    "Available",
    "On Hand",
];
pub const OPENING_STOCK_ALIASES: &[&str] = &[
    "OpeningStock",
    "Opening Stock",
    "Opening Qty",
    "Opening Quantity",
    "Opening Balance",
];
pub const MOVEMENT_ALIASES: &[&str] = &["Movement", "Net Movement", "Stock Movement"];
pub const INWARD_ALIASES: &[&str] = &["Inward", "Inwards", "Inward Qty", "Received", "Stock In"];
pub const OUTWARD_ALIASES: &[&str] = &["Outward", "Outwards", "Outward Qty", "Issued", "Stock Out"];

/// 数量解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityResolution {
    pub quantity: Option<i64>,
    pub source: QuantitySource,
    pub reason: Option<String>,
}

impl QuantityResolution {
    fn found(value: f64, source: QuantitySource) -> Self {
        Self {
            quantity: Some(clamp_quantity(value)),
            source,
            reason: None,
        }
    }
}

/// max(0, round(value))
fn clamp_quantity(value: f64) -> i64 {
    value.round().max(0.0) as i64
}

pub struct QuantityResolver {
    cleaner: DataCleaner,
}

impl QuantityResolver {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 在别名族中取第一个可解析的数值
    fn family_value(&self, record: &RawRecord, aliases: &[&str]) -> Option<f64> {
        aliases
            .iter()
            .filter_map(|alias| record.get(alias))
            .find_map(|cell| self.cleaner.parse_stock_value(cell))
    }
}

impl Default for QuantityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantityResolverTrait for QuantityResolver {
    fn resolve(&self, record: &RawRecord) -> QuantityResolution {
        // 规则 1: 期末库存直取
        if let Some(closing) = self.family_value(record, CLOSING_STOCK_ALIASES) {
            return QuantityResolution::found(closing, QuantitySource::ClosingStockDirect);
        }

        let opening = self.family_value(record, OPENING_STOCK_ALIASES);
        let movement = self.family_value(record, MOVEMENT_ALIASES);
        let inward = self.family_value(record, INWARD_ALIASES);
        let outward = self.family_value(record, OUTWARD_ALIASES);

        match (opening, movement) {
            // 规则 2: 期初 + 变动
            (Some(opening), Some(movement)) => QuantityResolution::found(
                opening + movement,
                QuantitySource::OpeningPlusMovement,
            ),
            // 规则 3: 期初 + 入库 - 出库
            (Some(opening), None) if inward.is_some() || outward.is_some() => {
                QuantityResolution::found(
                    opening + inward.unwrap_or(0.0) - outward.unwrap_or(0.0),
                    QuantitySource::OpeningPlusInwardMinusOutward,
                )
            }
            // 规则 4: 仅期初
            (Some(opening), None) => {
                QuantityResolution::found(opening, QuantitySource::OpeningStockFallback)
            }
            // 规则 5: 无可用字段
            (None, _) => QuantityResolution {
                quantity: None,
                source: QuantitySource::MissingStockFields,
                reason: Some(
                    "Missing stock quantity: no parseable closing stock or opening stock value"
                        .to_string(),
                ),
            },
        }
    }
}
