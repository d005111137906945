// ==========================================
// 库存对账同步 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 库存数值解析
// 规则:
// - 数值单元格：有限值即通过
// - 文本单元格：去千分位分隔符后按浮点解析
// - 可识别的空值标记（not stocked / n/a / na / none / null / -）→ 0
// - 其他无法解析的值 → None（不是 0）
// ==========================================

use crate::importer::file_parser::CellValue;

/// 视为“零库存”的文本标记（大小写不敏感）
pub const EMPTY_STOCK_TOKENS: &[&str] = &["not stocked", "n/a", "na", "none", "null", "-"];

pub struct DataCleaner;

impl DataCleaner {
    /// 清洗文本字段（TRIM）
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    /// 标准化 NULL 值（空字符串/空白 → None）
    pub fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析库存数值单元格
    ///
    /// # 返回
    /// - Some(f64): 解析成功（空值标记返回 0.0）
    /// - None: 空白或无法解析
    pub fn parse_stock_value(&self, cell: &CellValue) -> Option<f64> {
        match cell {
            CellValue::Empty => None,
            CellValue::Number(n) => n.is_finite().then_some(*n),
            CellValue::Text(text) => self.parse_stock_text(text),
        }
    }

    fn parse_stock_text(&self, text: &str) -> Option<f64> {
        let trimmed = self.clean_text(text);
        if trimmed.is_empty() {
            return None;
        }

        let lowered = trimmed.to_lowercase();
        if EMPTY_STOCK_TOKENS.contains(&lowered.as_str()) {
            return Some(0.0);
        }

        // 去除千分位分隔符
        let digits: String = trimmed.chars().filter(|c| *c != ',').collect();
        digits
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }
}
