// ==========================================
// Mock 远端商品目录 - 用于集成测试
// ==========================================
// 内存中的位置 / 商品 / 库存水平，记录每次调用
// ==========================================

use async_trait::async_trait;
use inventory_sync::domain::{Location, ProductCandidate, SelectedOption, VariantNode};
use inventory_sync::engine::{BatchProgress, ProgressObserver};
use inventory_sync::engine::title_matcher::title_score;
use inventory_sync::gateway::{CatalogGateway, GatewayError, GatewayResult};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// 构造变体（inventory item id = "item-<key>"）
pub fn variant(key: &str, sku: Option<&str>, title: &str, options: &[&str]) -> VariantNode {
    VariantNode {
        id: format!("variant-{}", key),
        sku: sku.map(str::to_string),
        barcode: None,
        title: title.to_string(),
        product_title: String::new(),
        inventory_item_id: format!("item-{}", key),
        selected_options: options
            .iter()
            .enumerate()
            .map(|(i, v)| SelectedOption {
                name: format!("Option{}", i + 1),
                value: v.to_string(),
            })
            .collect(),
    }
}

#[derive(Default)]
pub struct MockCatalog {
    locations: Vec<Location>,
    products: Vec<ProductCandidate>,
    levels: Mutex<HashMap<(String, String), i64>>,
    failing_sets: HashSet<String>,
    failing_lookups: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, id: &str, name: &str) -> Self {
        self.locations.push(Location {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_product(mut self, handle: &str, title: &str, variants: Vec<VariantNode>) -> Self {
        let variants = variants
            .into_iter()
            .map(|mut v| {
                v.product_title = title.to_string();
                v
            })
            .collect();
        self.products.push(ProductCandidate {
            id: format!("product-{}", handle),
            title: title.to_string(),
            handle: handle.to_string(),
            variants,
        });
        self
    }

    pub fn with_barcode(mut self, variant_key: &str, barcode: &str) -> Self {
        let id = format!("variant-{}", variant_key);
        for product in &mut self.products {
            for v in &mut product.variants {
                if v.id == id {
                    v.barcode = Some(barcode.to_string());
                }
            }
        }
        self
    }

    pub fn with_level(self, item_id: &str, location_id: &str, quantity: i64) -> Self {
        self.levels
            .lock()
            .unwrap()
            .insert((item_id.to_string(), location_id.to_string()), quantity);
        self
    }

    /// set_quantity 对该库存项返回 HTTP 500
    pub fn failing_set_for(mut self, item_id: &str) -> Self {
        self.failing_sets.insert(item_id.to_string());
        self
    }

    /// variant_by_sku 对该 SKU 返回传输错误
    pub fn failing_lookup_for(mut self, sku: &str) -> Self {
        self.failing_lookups.insert(sku.to_lowercase());
        self
    }

    pub fn level(&self, item_id: &str, location_id: &str) -> Option<i64> {
        self.levels
            .lock()
            .unwrap()
            .get(&(item_id.to_string(), location_id.to_string()))
            .copied()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn all_variants(&self) -> impl Iterator<Item = &VariantNode> {
        self.products.iter().flat_map(|p| p.variants.iter())
    }
}

#[async_trait]
impl CatalogGateway for MockCatalog {
    async fn list_locations(&self) -> GatewayResult<Vec<Location>> {
        self.record("list_locations".to_string());
        Ok(self.locations.clone())
    }

    async fn variant_by_sku(&self, sku: &str) -> GatewayResult<Option<VariantNode>> {
        self.record(format!("variant_by_sku:{}", sku));
        if self.failing_lookups.contains(&sku.to_lowercase()) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        Ok(self
            .all_variants()
            .find(|v| {
                v.sku
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(sku))
            })
            .cloned())
    }

    async fn variant_by_barcode(&self, barcode: &str) -> GatewayResult<Option<VariantNode>> {
        self.record(format!("variant_by_barcode:{}", barcode));
        Ok(self
            .all_variants()
            .find(|v| v.barcode.as_deref() == Some(barcode))
            .cloned())
    }

    async fn variants_by_handle(&self, handle: &str) -> GatewayResult<Vec<VariantNode>> {
        self.record(format!("variants_by_handle:{}", handle));
        Ok(self
            .products
            .iter()
            .find(|p| p.handle.eq_ignore_ascii_case(handle))
            .map(|p| p.variants.clone())
            .unwrap_or_default())
    }

    async fn products_by_title(
        &self,
        title: &str,
        limit: usize,
    ) -> GatewayResult<Vec<ProductCandidate>> {
        self.record(format!("products_by_title:{}", title));
        Ok(self
            .products
            .iter()
            .filter(|p| title_score(title, &p.title) > 0.0)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn current_quantity(
        &self,
        inventory_item_id: &str,
        location_id: &str,
    ) -> GatewayResult<Option<i64>> {
        self.record(format!("current_quantity:{}@{}", inventory_item_id, location_id));
        Ok(self.level(inventory_item_id, location_id))
    }

    async fn set_quantity(
        &self,
        inventory_item_id: &str,
        location_id: &str,
        quantity: i64,
    ) -> GatewayResult<()> {
        self.record(format!(
            "set_quantity:{}@{}={}",
            inventory_item_id, location_id, quantity
        ));
        if self.failing_sets.contains(inventory_item_id) {
            return Err(GatewayError::Http {
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }
        self.levels.lock().unwrap().insert(
            (inventory_item_id.to_string(), location_id.to_string()),
            quantity,
        );
        Ok(())
    }

    async fn holding_locations(&self, inventory_item_id: &str) -> GatewayResult<Vec<Location>> {
        self.record(format!("holding_locations:{}", inventory_item_id));
        let levels = self.levels.lock().unwrap();
        Ok(self
            .locations
            .iter()
            .filter(|l| levels.contains_key(&(inventory_item_id.to_string(), l.id.clone())))
            .cloned()
            .collect())
    }
}

/// 记录批次进度事件
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<BatchProgress>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<BatchProgress> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_batch(&self, progress: &BatchProgress) {
        self.events.lock().unwrap().push(progress.clone());
    }
}
