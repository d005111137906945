// ==========================================
// 库存对账同步 - 导入层
// ==========================================
// 职责: 上传表格 → 行记录 → 去重/合并
// 支持: Excel (.xlsx/.xls/.ods), CSV
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod quantity_resolver;
pub mod row_importer;
pub mod row_importer_trait;

// 重导出核心类型
pub use conflict_handler::{ConflictHandler, DedupOutcome};
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{CellValue, CsvParser, ExcelParser, RawRecord, UniversalFileParser};
pub use quantity_resolver::{QuantityResolution, QuantityResolver};
pub use row_importer::{ParseOutcome, RowImporter};

// 重导出 Trait 接口
pub use row_importer_trait::{FieldMapper, FileParser, QuantityResolverTrait, ResolvedQuantity};
