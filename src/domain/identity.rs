// ==========================================
// 库存对账同步 - 身份键
// ==========================================
// 职责: 行标识 + 规格值 → 确定性身份键
// 用途: 去重分组 / 变体解析缓存共用同一键定义
// ==========================================

use crate::domain::row::ParsedRow;
use std::fmt;

const FIELD_SEPARATOR: char = '\u{1f}';
const OPTION_SEPARATOR: char = '\u{1e}';

/// 身份键：小写 + 去首尾空白后的 (sku, item_code, barcode, handle, title, 规格值...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn from_row(row: &ParsedRow) -> Self {
        let ids = &row.identifiers;
        let mut key = String::new();

        for field in [&ids.sku, &ids.item_code, &ids.barcode, &ids.handle, &ids.title] {
            key.push_str(&normalize(field.as_deref()));
            key.push(FIELD_SEPARATOR);
        }

        let options: Vec<String> = row
            .option_values
            .iter()
            .map(|v| normalize(Some(v)))
            .collect();
        key.push_str(&options.join(&OPTION_SEPARATOR.to_string()));

        IdentityKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 分隔符不可见，展示时替换为 '|'
        let printable: String = self
            .0
            .chars()
            .map(|c| if c == FIELD_SEPARATOR || c == OPTION_SEPARATOR { '|' } else { c })
            .collect();
        f.write_str(&printable)
    }
}

// ==========================================
// GroupKey - 去重分组键（身份键 + 位置）
// ==========================================
// location = None 表示行未指定位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub identity: IdentityKey,
    pub location: Option<String>,
}

impl GroupKey {
    pub fn from_row(row: &ParsedRow) -> Self {
        let location = row
            .location_name
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty());

        Self {
            identity: IdentityKey::from_row(row),
            location,
        }
    }
}

fn normalize(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}
