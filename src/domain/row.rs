// ==========================================
// 库存对账同步 - 行记录模型
// ==========================================
// 职责: 解析后行记录 (ParsedRow) / 结果行 (ResultRow)
// 约束: ParsedRow 生成后不可变；quantity 恒为非负整数
// ==========================================

use crate::domain::types::QuantitySource;
use serde::{Deserialize, Serialize};

// ==========================================
// RowIdentifiers - 行标识字段
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIdentifiers {
    pub sku: Option<String>,       // SKU / Variant SKU
    pub item_code: Option<String>, // 物料编码
    pub barcode: Option<String>,   // 条码
    pub handle: Option<String>,    // 商品 handle
    pub title: Option<String>,     // 商品标题
}

impl RowIdentifiers {
    /// 五个标识字段是否全部缺失
    pub fn is_empty(&self) -> bool {
        self.sku.is_none()
            && self.item_code.is_none()
            && self.barcode.is_none()
            && self.handle.is_none()
            && self.title.is_none()
    }

    /// 用于结果展示的名称（标题优先）
    pub fn display_name(&self) -> String {
        self.title
            .as_ref()
            .or(self.handle.as_ref())
            .or(self.sku.as_ref())
            .or(self.item_code.as_ref())
            .or(self.barcode.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

// ==========================================
// ParsedRow - 解析后的行记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub row_number: usize, // 表格行号（表头=1，首个数据行=2）
    pub identifiers: RowIdentifiers,
    pub option_values: Vec<String>, // 规格值（保持列顺序）
    pub quantity: i64,
    pub quantity_source: QuantitySource,
    pub location_name: Option<String>,
    pub bin_name: Option<String>,
}

// ==========================================
// ResultRow - 结果行（上传接口 JSON 契约）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub row_number: usize,
    pub sku: String,
    pub item_name: String,
    pub location_name: String,
    pub quantity: Option<i64>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_source: Option<QuantitySource>,
}

impl ResultRow {
    /// 由解析行生成结果行（位置名取行内原值）
    pub fn from_row(row: &ParsedRow, reason: impl Into<String>) -> Self {
        Self {
            row_number: row.row_number,
            sku: row.identifiers.sku.clone().unwrap_or_default(),
            item_name: row.identifiers.display_name(),
            location_name: row.location_name.clone().unwrap_or_default(),
            quantity: Some(row.quantity),
            reason: reason.into(),
            quantity_source: Some(row.quantity_source),
        }
    }

    /// 行本身无 SKU 时用远端变体的 SKU 补齐
    pub fn with_fallback_sku(mut self, sku: impl Into<String>) -> Self {
        if self.sku.trim().is_empty() {
            self.sku = sku.into();
        }
        self
    }
}
