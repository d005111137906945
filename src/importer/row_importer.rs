// ==========================================
// 库存对账同步 - 表格行导入器
// ==========================================
// 流程: 解析（第一个工作表）→ 标识检查 → 数量派生 → 字段映射
// 约束: 输出保持行顺序；缺标识的行不再计算数量
// ==========================================

use crate::domain::{ParsedRow, QuantitySource, ResultRow};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use crate::importer::quantity_resolver::QuantityResolver;
use crate::importer::row_importer_trait::{
    FieldMapper as FieldMapperTrait, QuantityResolverTrait, ResolvedQuantity,
};
use tracing::{debug, info, instrument};

pub const MISSING_IDENTIFIER_REASON: &str =
    "Missing identifier: row has no SKU, item code, handle, barcode or title";
pub const EMPTY_SHEET_REASON: &str = "No data rows found in the first sheet";

/// 行导入结果
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub rows: Vec<ParsedRow>,
    pub skipped: Vec<ResultRow>,
}

impl ParseOutcome {
    pub fn total(&self) -> usize {
        self.rows.len() + self.skipped.len()
    }
}

pub struct RowImporter {
    file_parser: UniversalFileParser,
    field_mapper: Box<dyn FieldMapperTrait>,
    quantity_resolver: Box<dyn QuantityResolverTrait>,
}

impl RowImporter {
    pub fn new() -> Self {
        Self {
            file_parser: UniversalFileParser,
            field_mapper: Box::new(FieldMapper::new()),
            quantity_resolver: Box::new(QuantityResolver::new()),
        }
    }

    /// 从上传字节导入行记录
    ///
    /// # 参数
    /// - bytes: 上传文件原始字节
    /// - file_name: 可选文件名（用于格式识别提示）
    ///
    /// # 返回
    /// - Ok(ParseOutcome): 可处理行 + 立即跳过的行
    /// - Err: 无法识别/读取的文件
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn import(&self, bytes: &[u8], file_name: Option<&str>) -> ImportResult<ParseOutcome> {
        let records = self.file_parser.parse(bytes, file_name)?;
        info!(total_rows = records.len(), "文件解析完成");

        let mut outcome = ParseOutcome::default();
        if records.is_empty() {
            outcome.skipped.push(empty_sheet_record());
            return Ok(outcome);
        }

        for record in &records {
            match self.map_record(record) {
                Ok(row) => outcome.rows.push(row),
                Err(skipped) => {
                    debug!(row_number = skipped.row_number, reason = %skipped.reason, "行跳过");
                    outcome.skipped.push(skipped);
                }
            }
        }

        info!(
            rows = outcome.rows.len(),
            skipped = outcome.skipped.len(),
            "行映射完成"
        );
        Ok(outcome)
    }

    fn map_record(&self, record: &RawRecord) -> Result<ParsedRow, ResultRow> {
        // 缺少全部标识字段：不计算数量，直接跳过
        if !self.field_mapper.has_identifier(record) {
            let placeholder = ResolvedQuantity {
                quantity: 0,
                source: QuantitySource::MissingStockFields,
            };
            let row = self.field_mapper.map_to_parsed_row(record, &placeholder);
            return Err(ResultRow {
                quantity: None,
                quantity_source: None,
                ..ResultRow::from_row(&row, MISSING_IDENTIFIER_REASON)
            });
        }

        let resolution = self.quantity_resolver.resolve(record);
        match resolution.quantity {
            Some(quantity) => Ok(self.field_mapper.map_to_parsed_row(
                record,
                &ResolvedQuantity {
                    quantity,
                    source: resolution.source,
                },
            )),
            None => {
                let placeholder = ResolvedQuantity {
                    quantity: 0,
                    source: resolution.source,
                };
                let row = self.field_mapper.map_to_parsed_row(record, &placeholder);
                let reason = resolution
                    .reason
                    .unwrap_or_else(|| "Missing stock quantity".to_string());
                Err(ResultRow {
                    quantity: None,
                    ..ResultRow::from_row(&row, reason)
                })
            }
        }
    }
}

impl Default for RowImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_sheet_record() -> ResultRow {
    ResultRow {
        row_number: 1,
        sku: String::new(),
        item_name: String::new(),
        location_name: String::new(),
        quantity: None,
        reason: EMPTY_SHEET_REASON.to_string(),
        quantity_source: None,
    }
}
