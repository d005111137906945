// ==========================================
// 库存对账同步 - 行导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// ==========================================

use crate::domain::ParsedRow;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::RawRecord;
use crate::importer::quantity_resolver::QuantityResolution;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解析上传字节为原始行记录（第一个工作表）
    ///
    /// # 返回
    /// - Ok(Vec<RawRecord>): 行记录列表（已跳过完全空白行）
    /// - Err: 格式错误
    fn parse_to_raw_records(&self, bytes: &[u8]) -> ImportResult<Vec<RawRecord>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 列别名 → 逻辑字段（阶段 1）
// 实现者: FieldMapper
pub trait FieldMapper: Send + Sync {
    /// 将原始行记录映射为 ParsedRow
    ///
    /// # 参数
    /// - record: 原始行记录
    /// - quantity: 阶段 2 得出的数量（必须已存在）
    ///
    /// # 返回
    /// - ParsedRow: 标识、规格值、位置、库位
    fn map_to_parsed_row(&self, record: &RawRecord, quantity: &ResolvedQuantity) -> ParsedRow;

    /// 行内是否至少存在一个标识字段（sku/item_code/handle/barcode/title）
    fn has_identifier(&self, record: &RawRecord) -> bool;
}

// ==========================================
// QuantityResolver Trait
// ==========================================
// 用途: 目标数量级联计算（阶段 2）
// 实现者: QuantityResolver
pub trait QuantityResolverTrait: Send + Sync {
    /// 按 期末 → 期初+变动 → 期初+入-出 → 期初 顺序计算
    fn resolve(&self, record: &RawRecord) -> QuantityResolution;
}

/// 已确定的数量（非负整数 + 来源）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedQuantity {
    pub quantity: i64,
    pub source: crate::domain::QuantitySource,
}
