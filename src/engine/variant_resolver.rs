// ==========================================
// 库存对账同步 - 变体解析器
// ==========================================
// 职责: 行标识 → 唯一远端变体，或给出失败原因
// 结构: 有序策略列表，命中即停
//   1. SKU 精确查找
//   2. 物料编码（按 SKU 机制查找）
//   3. 条码精确查找
//   4. handle + 规格值过滤
//   5. 标题模糊匹配 + 规格值过滤
// 缓存: 由执行器按身份键预取，解析器本身无状态
// ==========================================

use crate::domain::{ParsedRow, ResolvedVariant, VariantNode, VariantResolution};
use crate::engine::title_matcher::{pick_best, TitleMatch};
use crate::gateway::{CatalogGateway, GatewayResult};
use async_trait::async_trait;
use tracing::{debug, instrument};

pub const NO_MATCH_REASON: &str = "no matching variant by any identifier";

/// 单个策略的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Matched(VariantNode),
    /// 终止解析并以该原因失败
    Rejected(String),
    /// 本策略不适用或未命中，交给下一个策略
    Continue,
}

#[async_trait]
pub trait VariantStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        row: &ParsedRow,
        gateway: &dyn CatalogGateway,
    ) -> GatewayResult<StrategyOutcome>;
}

// ==========================================
// 规格值过滤
// ==========================================

/// 行内每个规格值（大小写不敏感）都出现在变体的已选规格中
pub fn matches_options(variant: &VariantNode, option_values: &[String]) -> bool {
    option_values.iter().all(|wanted| {
        let wanted = wanted.trim();
        variant
            .selected_options
            .iter()
            .any(|opt| opt.value.trim().eq_ignore_ascii_case(wanted))
    })
}

fn filter_by_options(variants: Vec<VariantNode>, option_values: &[String]) -> Vec<VariantNode> {
    variants
        .into_iter()
        .filter(|v| matches_options(v, option_values))
        .collect()
}

fn title_equals(variant: &VariantNode, title: &str) -> bool {
    let title = title.trim();
    variant.title.trim().eq_ignore_ascii_case(title)
        || variant.display_title().trim().eq_ignore_ascii_case(title)
}

/// 多个候选变体时按标题精确相等（大小写不敏感）收窄
fn disambiguate_by_title(
    mut variants: Vec<VariantNode>,
    title: Option<&str>,
    context: &str,
) -> StrategyOutcome {
    let count = variants.len();
    if let Some(title) = title {
        let mut equal: Vec<VariantNode> = variants
            .drain(..)
            .filter(|v| title_equals(v, title))
            .collect();
        if equal.len() == 1 {
            return StrategyOutcome::Matched(equal.remove(0));
        }
    }
    StrategyOutcome::Rejected(format!("{} matched multiple variants ({})", context, count))
}

fn describe_options(option_values: &[String]) -> String {
    option_values.join(" / ")
}

// ==========================================
// 精确标识策略
// ==========================================

/// 精确查找的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactField {
    Sku,
    ItemCode,
    Barcode,
}

pub struct ExactLookupStrategy {
    field: ExactField,
}

impl ExactLookupStrategy {
    pub fn new(field: ExactField) -> Self {
        Self { field }
    }
}

#[async_trait]
impl VariantStrategy for ExactLookupStrategy {
    fn name(&self) -> &'static str {
        match self.field {
            ExactField::Sku => "sku",
            ExactField::ItemCode => "item_code",
            ExactField::Barcode => "barcode",
        }
    }

    async fn attempt(
        &self,
        row: &ParsedRow,
        gateway: &dyn CatalogGateway,
    ) -> GatewayResult<StrategyOutcome> {
        let ids = &row.identifiers;
        let value = match self.field {
            ExactField::Sku => ids.sku.as_deref(),
            ExactField::ItemCode => ids.item_code.as_deref(),
            ExactField::Barcode => ids.barcode.as_deref(),
        };
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(StrategyOutcome::Continue);
        };

        let found = match self.field {
            ExactField::Sku | ExactField::ItemCode => gateway.variant_by_sku(value).await?,
            ExactField::Barcode => gateway.variant_by_barcode(value).await?,
        };

        Ok(found.map_or(StrategyOutcome::Continue, StrategyOutcome::Matched))
    }
}

// ==========================================
// handle 策略
// ==========================================

pub struct HandleStrategy;

#[async_trait]
impl VariantStrategy for HandleStrategy {
    fn name(&self) -> &'static str {
        "handle"
    }

    async fn attempt(
        &self,
        row: &ParsedRow,
        gateway: &dyn CatalogGateway,
    ) -> GatewayResult<StrategyOutcome> {
        let Some(handle) = row
            .identifiers
            .handle
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
        else {
            return Ok(StrategyOutcome::Continue);
        };

        let variants = gateway.variants_by_handle(handle).await?;
        if variants.is_empty() {
            return Ok(StrategyOutcome::Rejected(format!(
                "no product for handle \"{}\"",
                handle
            )));
        }

        let mut matching = filter_by_options(variants, &row.option_values);
        let title = row.identifiers.title.as_deref();

        Ok(match matching.len() {
            0 if title.is_some() => StrategyOutcome::Continue,
            0 => StrategyOutcome::Rejected(format!(
                "no variant of handle \"{}\" matches options \"{}\"",
                handle,
                describe_options(&row.option_values)
            )),
            1 => StrategyOutcome::Matched(matching.remove(0)),
            _ => disambiguate_by_title(matching, title, &format!("handle \"{}\"", handle)),
        })
    }
}

// ==========================================
// 标题模糊匹配策略
// ==========================================

pub struct FuzzyTitleStrategy {
    candidate_limit: usize,
}

impl FuzzyTitleStrategy {
    pub fn new(candidate_limit: usize) -> Self {
        Self {
            candidate_limit: candidate_limit.max(1),
        }
    }
}

#[async_trait]
impl VariantStrategy for FuzzyTitleStrategy {
    fn name(&self) -> &'static str {
        "fuzzy_title"
    }

    async fn attempt(
        &self,
        row: &ParsedRow,
        gateway: &dyn CatalogGateway,
    ) -> GatewayResult<StrategyOutcome> {
        let Some(title) = row
            .identifiers
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return Ok(StrategyOutcome::Continue);
        };

        let mut candidates = gateway
            .products_by_title(title, self.candidate_limit)
            .await?;
        let titles: Vec<&str> = candidates.iter().map(|c| c.title.as_str()).collect();

        let index = match pick_best(title, &titles) {
            TitleMatch::Accepted { index, score } => {
                debug!(title, matched = titles[index], score, "标题模糊匹配命中");
                index
            }
            TitleMatch::Rejected(reason) => return Ok(StrategyOutcome::Rejected(reason)),
        };

        let product = candidates.swap_remove(index);
        let mut matching = filter_by_options(product.variants, &row.option_values);

        Ok(match matching.len() {
            0 => StrategyOutcome::Rejected(format!(
                "product \"{}\" has no variant matching options \"{}\"",
                product.title,
                describe_options(&row.option_values)
            )),
            1 => StrategyOutcome::Matched(matching.remove(0)),
            _ => disambiguate_by_title(
                matching,
                Some(title),
                &format!("product \"{}\"", product.title),
            ),
        })
    }
}

// ==========================================
// VariantResolver - 策略编排
// ==========================================
pub struct VariantResolver {
    strategies: Vec<Box<dyn VariantStrategy>>,
}

impl VariantResolver {
    /// 默认策略顺序
    pub fn new(fuzzy_candidate_limit: usize) -> Self {
        Self::with_strategies(vec![
            Box::new(ExactLookupStrategy::new(ExactField::Sku)),
            Box::new(ExactLookupStrategy::new(ExactField::ItemCode)),
            Box::new(ExactLookupStrategy::new(ExactField::Barcode)),
            Box::new(HandleStrategy),
            Box::new(FuzzyTitleStrategy::new(fuzzy_candidate_limit)),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn VariantStrategy>>) -> Self {
        Self { strategies }
    }

    /// 解析单行；远端错误原样上抛，由调用方转为失败解析
    #[instrument(skip(self, row, gateway), fields(row = row.row_number))]
    pub async fn resolve(
        &self,
        row: &ParsedRow,
        gateway: &dyn CatalogGateway,
    ) -> GatewayResult<VariantResolution> {
        for strategy in &self.strategies {
            match strategy.attempt(row, gateway).await? {
                StrategyOutcome::Matched(variant) => {
                    debug!(strategy = strategy.name(), variant = %variant.id, "变体解析成功");
                    return Ok(VariantResolution::resolved(to_resolved(row, variant)));
                }
                StrategyOutcome::Rejected(reason) => {
                    debug!(strategy = strategy.name(), %reason, "变体解析失败");
                    return Ok(VariantResolution::failed(reason));
                }
                StrategyOutcome::Continue => {}
            }
        }
        Ok(VariantResolution::failed(NO_MATCH_REASON))
    }
}

/// SKU 优先取行内值，其次取远端变体的值
fn to_resolved(row: &ParsedRow, variant: VariantNode) -> ResolvedVariant {
    let sku = row
        .identifiers
        .sku
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| variant.sku.clone())
        .unwrap_or_default();

    ResolvedVariant {
        product_title: variant.display_title(),
        inventory_item_id: variant.inventory_item_id,
        sku,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QuantitySource, RowIdentifiers, SelectedOption};

    fn variant(title: &str, options: &[&str]) -> VariantNode {
        VariantNode {
            id: format!("gid://shopify/ProductVariant/{}", title),
            sku: Some(format!("SKU-{}", title)),
            barcode: None,
            title: title.to_string(),
            product_title: "Hoodie".to_string(),
            inventory_item_id: format!("gid://shopify/InventoryItem/{}", title),
            selected_options: options
                .iter()
                .map(|v| SelectedOption {
                    name: "Option".to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    fn row(sku: Option<&str>) -> ParsedRow {
        ParsedRow {
            row_number: 2,
            identifiers: RowIdentifiers {
                sku: sku.map(str::to_string),
                ..Default::default()
            },
            option_values: vec![],
            quantity: 1,
            quantity_source: QuantitySource::ClosingStockDirect,
            location_name: None,
            bin_name: None,
        }
    }

    #[test]
    fn test_matches_options_subset_case_insensitive() {
        let v = variant("M / Blue", &["M", "Blue"]);
        assert!(matches_options(&v, &[]));
        assert!(matches_options(&v, &["blue".to_string()]));
        assert!(matches_options(&v, &[" m ".to_string(), "BLUE".to_string()]));
        assert!(!matches_options(&v, &["L".to_string()]));
    }

    #[test]
    fn test_disambiguate_by_title() {
        let variants = vec![variant("M", &["M"]), variant("L", &["L"])];
        assert!(matches!(
            disambiguate_by_title(variants.clone(), Some("hoodie - l"), "handle"),
            StrategyOutcome::Matched(v) if v.title == "L"
        ));
        match disambiguate_by_title(variants, None, "handle \"hoodie\"") {
            StrategyOutcome::Rejected(reason) => {
                assert_eq!(reason, "handle \"hoodie\" matched multiple variants (2)")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_resolved_sku_prefers_row_value() {
        let resolved = to_resolved(&row(Some("ROW-SKU")), variant("M", &[]));
        assert_eq!(resolved.sku, "ROW-SKU");

        let resolved = to_resolved(&row(Some("  ")), variant("M", &[]));
        assert_eq!(resolved.sku, "SKU-M");
        assert_eq!(resolved.product_title, "Hoodie - M");
    }
}
