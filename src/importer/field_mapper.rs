// ==========================================
// 库存对账同步 - 字段映射器实现
// ==========================================
// 职责: 源列名（别名表）→ 逻辑字段
// 匹配: 列名大小写不敏感，去首尾空白
// ==========================================

use crate::domain::{ParsedRow, RowIdentifiers};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::file_parser::RawRecord;
use crate::importer::row_importer_trait::{FieldMapper as FieldMapperTrait, ResolvedQuantity};

// ==========================================
// 列名别名表
// ==========================================
pub const SKU_ALIASES: &[&str] = &["SKU", "Variant SKU"];
pub const ITEM_CODE_ALIASES: &[&str] = &["Item Code", "ItemCode", "Item No", "Product Code"];
pub const BARCODE_ALIASES: &[&str] = &["Barcode", "Variant Barcode", "EAN", "UPC"];
pub const HANDLE_ALIASES: &[&str] = &["Handle", "Product Handle"];
pub const TITLE_ALIASES: &[&str] = &["Title", "Product Title", "Item Name", "Product Name"];
pub const LOCATION_ALIASES: &[&str] = &[
    "ShopifyLocationName",
    "Location",
    "Location Name",
    "Inventory Location",
];
pub const BIN_ALIASES: &[&str] = &["Bin", "Bin Name", "BinName", "Bin Location"];

// 规格值列（顺序即 option1 / option2 / option3）
pub const OPTION_VALUE_ALIASES: &[&[&str]] = &[
    &["Option1 Value", "Option 1 Value", "Option1"],
    &["Option2 Value", "Option 2 Value", "Option2"],
    &["Option3 Value", "Option 3 Value", "Option3"],
];

pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 提取字符串字段（返回 Option），依次尝试各别名，取第一个非空值
    fn get_string(&self, record: &RawRecord, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .filter_map(|alias| record.get(alias))
            .find_map(|cell| self.cleaner.normalize_null(cell.as_text()))
    }

    fn identifiers(&self, record: &RawRecord) -> RowIdentifiers {
        RowIdentifiers {
            sku: self.get_string(record, SKU_ALIASES),
            item_code: self.get_string(record, ITEM_CODE_ALIASES),
            barcode: self.get_string(record, BARCODE_ALIASES),
            handle: self.get_string(record, HANDLE_ALIASES),
            title: self.get_string(record, TITLE_ALIASES),
        }
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapperTrait for FieldMapper {
    fn map_to_parsed_row(&self, record: &RawRecord, quantity: &ResolvedQuantity) -> ParsedRow {
        // 仅保留非空规格值，顺序不变
        let option_values = OPTION_VALUE_ALIASES
            .iter()
            .filter_map(|aliases| self.get_string(record, aliases))
            .collect();

        ParsedRow {
            row_number: record.row_number,
            identifiers: self.identifiers(record),
            option_values,
            quantity: quantity.quantity,
            quantity_source: quantity.source,
            location_name: self.get_string(record, LOCATION_ALIASES),
            bin_name: self.get_string(record, BIN_ALIASES),
        }
    }

    fn has_identifier(&self, record: &RawRecord) -> bool {
        !self.identifiers(record).is_empty()
    }
}
