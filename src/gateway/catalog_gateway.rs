// ==========================================
// 库存对账同步 - 远端商品目录网关 Trait
// ==========================================
// 职责: 定义引擎依赖的远端请求/响应接口（不包含实现）
// 实现者: ShopifyGateway（每个方法自带限流重试）
// ==========================================

use crate::domain::{Location, ProductCandidate, VariantNode};
use crate::gateway::error::GatewayResult;
use async_trait::async_trait;

#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// 店铺全部库存位置
    async fn list_locations(&self) -> GatewayResult<Vec<Location>>;

    /// 按 SKU 精确查找变体（大小写不敏感）
    async fn variant_by_sku(&self, sku: &str) -> GatewayResult<Option<VariantNode>>;

    /// 按条码精确查找变体
    async fn variant_by_barcode(&self, barcode: &str) -> GatewayResult<Option<VariantNode>>;

    /// 按 handle 查找商品的全部变体；商品不存在时返回空集
    async fn variants_by_handle(&self, handle: &str) -> GatewayResult<Vec<VariantNode>>;

    /// 按标题全文搜索候选商品（按相关度排序，最多 limit 个）
    async fn products_by_title(
        &self,
        title: &str,
        limit: usize,
    ) -> GatewayResult<Vec<ProductCandidate>>;

    /// 读取 (库存项, 位置) 当前可用数量；该位置未建立库存记录时返回 None
    async fn current_quantity(
        &self,
        inventory_item_id: &str,
        location_id: &str,
    ) -> GatewayResult<Option<i64>>;

    /// 设置 (库存项, 位置) 可用数量
    async fn set_quantity(
        &self,
        inventory_item_id: &str,
        location_id: &str,
        quantity: i64,
    ) -> GatewayResult<()>;

    /// 当前持有该库存项的位置列表
    async fn holding_locations(&self, inventory_item_id: &str) -> GatewayResult<Vec<Location>>;
}
