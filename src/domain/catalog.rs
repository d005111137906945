// ==========================================
// 库存对账同步 - 远端商品目录模型
// ==========================================
// 职责: 位置 / 变体 / 商品候选 / 变体解析结果
// 用途: 网关层产出，引擎层只读
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Location - 远端库存位置
// ==========================================
// 每次运行拉取一次，之后只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

// ==========================================
// VariantNode - 远端变体
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantNode {
    pub id: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub title: String,         // 变体标题（如 "M / Blue"）
    pub product_title: String, // 所属商品标题
    pub inventory_item_id: String,
    pub selected_options: Vec<SelectedOption>,
}

impl VariantNode {
    /// 完整展示名："商品标题 - 变体标题"
    pub fn display_title(&self) -> String {
        if self.title.is_empty() || self.title.eq_ignore_ascii_case("Default Title") {
            self.product_title.clone()
        } else {
            format!("{} - {}", self.product_title, self.title)
        }
    }
}

// ==========================================
// ProductCandidate - 标题搜索候选商品
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCandidate {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub variants: Vec<VariantNode>,
}

// ==========================================
// VariantResolution - 变体解析结果
// ==========================================
// 按身份键缓存，仅在单次运行内有效
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    pub inventory_item_id: String,
    pub sku: String,
    pub product_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantResolution {
    pub variant: Option<ResolvedVariant>,
    pub reason: Option<String>,
}

impl VariantResolution {
    pub fn resolved(variant: ResolvedVariant) -> Self {
        Self {
            variant: Some(variant),
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            variant: None,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(title: &str) -> VariantNode {
        VariantNode {
            id: "gid://shopify/ProductVariant/1".to_string(),
            sku: None,
            barcode: None,
            title: title.to_string(),
            product_title: "Blue Hoodie".to_string(),
            inventory_item_id: "gid://shopify/InventoryItem/1".to_string(),
            selected_options: vec![],
        }
    }

    #[test]
    fn test_display_title_default_variant() {
        assert_eq!(variant("Default Title").display_title(), "Blue Hoodie");
        assert_eq!(variant("").display_title(), "Blue Hoodie");
        assert_eq!(variant("M").display_title(), "Blue Hoodie - M");
    }

    #[test]
    fn test_resolution_constructors() {
        let failed = VariantResolution::failed("no matching variant by any identifier");
        assert!(failed.variant.is_none());
        assert_eq!(
            failed.reason.as_deref(),
            Some("no matching variant by any identifier")
        );
    }
}
