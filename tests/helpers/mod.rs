// ==========================================
// 集成测试共享辅助
// ==========================================

#![allow(dead_code)]

pub mod mock_catalog;
pub mod sheet_builder;

pub use mock_catalog::{variant, MockCatalog, RecordingObserver};
pub use sheet_builder::SheetBuilder;
