// ==========================================
// 库存对账同步 - Shopify Admin GraphQL 网关
// ==========================================
// 职责: CatalogGateway 的 Shopify 实现
// 重试: 每次请求经 RetryPolicy 包装，HTTP 429 与 THROTTLED 视为限流
// ==========================================

use crate::config::ShopifyConfig;
use crate::domain::{Location, ProductCandidate, SelectedOption, VariantNode};
use crate::gateway::catalog_gateway::CatalogGateway;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

const VARIANT_FIELDS: &str = r#"
fragment VariantFields on ProductVariant {
  id
  sku
  barcode
  title
  selectedOptions { name value }
  inventoryItem { id }
  product { title }
}
"#;

const LOCATIONS_QUERY: &str = r#"
query Locations {
  locations(first: 250) { nodes { id name } }
}
"#;

const VARIANTS_BY_QUERY: &str = r#"
query VariantsByQuery($query: String!) {
  productVariants(first: 10, query: $query) { nodes { ...VariantFields } }
}
"#;

const PRODUCTS_BY_QUERY: &str = r#"
query ProductsByQuery($query: String!, $first: Int!) {
  products(first: $first, query: $query, sortKey: RELEVANCE) {
    nodes {
      id
      title
      handle
      variants(first: 100) { nodes { ...VariantFields } }
    }
  }
}
"#;

const INVENTORY_LEVEL_QUERY: &str = r#"
query InventoryLevel($itemId: ID!, $locationId: ID!) {
  inventoryItem(id: $itemId) {
    inventoryLevel(locationId: $locationId) {
      quantities(names: ["available"]) { name quantity }
    }
  }
}
"#;

const HOLDING_LOCATIONS_QUERY: &str = r#"
query HoldingLocations($itemId: ID!) {
  inventoryItem(id: $itemId) {
    inventoryLevels(first: 50) { nodes { location { id name } } }
  }
}
"#;

const SET_QUANTITIES_MUTATION: &str = r#"
mutation SetQuantities($input: InventorySetQuantitiesInput!) {
  inventorySetQuantities(input: $input) {
    userErrors { field message }
  }
}
"#;

// ==========================================
// ShopifyGateway
// ==========================================
pub struct ShopifyGateway {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    retry: RetryPolicy,
}

impl ShopifyGateway {
    /// 创建网关
    ///
    /// # 返回
    /// - Err(Configuration): 店铺域名或访问令牌缺失
    pub fn new(config: &ShopifyConfig, retry: RetryPolicy) -> GatewayResult<Self> {
        let domain = config.shop_domain.trim().trim_end_matches('/');
        if domain.is_empty() {
            return Err(GatewayError::Configuration(
                "shop domain is not configured".to_string(),
            ));
        }
        if config.access_token.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "access token is not configured".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;

        let host = domain
            .trim_start_matches("https://")
            .trim_start_matches("http://");

        Ok(Self {
            client,
            endpoint: format!(
                "https://{}/admin/api/{}/graphql.json",
                host, config.api_version
            ),
            access_token: config.access_token.clone(),
            retry,
        })
    }

    /// 替换 GraphQL 端点（代理或本地测试服务器）
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 执行 GraphQL 请求（含限流重试）
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> GatewayResult<T> {
        self.retry
            .run(operation, GatewayError::is_rate_limited, || {
                self.execute_once(operation, query, &variables)
            })
            .await
    }

    async fn execute_once<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: &Value,
    ) -> GatewayResult<T> {
        debug!(operation, "发送 GraphQL 请求");
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map(Duration::from_secs_f64);
            return Err(GatewayError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(operation, status = status.as_u16(), "GraphQL 请求失败");
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: truncate(&body, 300),
            });
        }

        let body: GraphQlResponse<T> = response.json().await?;
        body.into_data()
    }

    async fn variants_matching(&self, filter: &str, value: &str) -> GatewayResult<Vec<VariantNode>> {
        let data: VariantsData = self
            .execute(
                "variants_by_query",
                &format!("{}{}", VARIANTS_BY_QUERY, VARIANT_FIELDS),
                json!({ "query": format!("{}:\"{}\"", filter, escape_search(value)) }),
            )
            .await?;
        Ok(data
            .product_variants
            .nodes
            .into_iter()
            .map(VariantDto::into_node)
            .collect())
    }

    async fn products_matching(&self, query: String, first: usize) -> GatewayResult<Vec<ProductCandidate>> {
        let data: ProductsData = self
            .execute(
                "products_by_query",
                &format!("{}{}", PRODUCTS_BY_QUERY, VARIANT_FIELDS),
                json!({ "query": query, "first": first }),
            )
            .await?;
        Ok(data
            .products
            .nodes
            .into_iter()
            .map(ProductDto::into_candidate)
            .collect())
    }
}

#[async_trait]
impl CatalogGateway for ShopifyGateway {
    async fn list_locations(&self) -> GatewayResult<Vec<Location>> {
        let data: LocationsData = self
            .execute("list_locations", LOCATIONS_QUERY, json!({}))
            .await?;
        Ok(data.locations.nodes)
    }

    async fn variant_by_sku(&self, sku: &str) -> GatewayResult<Option<VariantNode>> {
        let wanted = sku.trim();
        let variants = self.variants_matching("sku", wanted).await?;
        Ok(variants.into_iter().find(|v| {
            v.sku
                .as_deref()
                .map(|s| s.trim().eq_ignore_ascii_case(wanted))
                .unwrap_or(false)
        }))
    }

    async fn variant_by_barcode(&self, barcode: &str) -> GatewayResult<Option<VariantNode>> {
        let wanted = barcode.trim();
        let variants = self.variants_matching("barcode", wanted).await?;
        Ok(variants.into_iter().find(|v| {
            v.barcode
                .as_deref()
                .map(|b| b.trim().eq_ignore_ascii_case(wanted))
                .unwrap_or(false)
        }))
    }

    async fn variants_by_handle(&self, handle: &str) -> GatewayResult<Vec<VariantNode>> {
        let wanted = handle.trim();
        let products = self
            .products_matching(format!("handle:\"{}\"", escape_search(wanted)), 5)
            .await?;
        Ok(products
            .into_iter()
            .find(|p| p.handle.eq_ignore_ascii_case(wanted))
            .map(|p| p.variants)
            .unwrap_or_default())
    }

    async fn products_by_title(
        &self,
        title: &str,
        limit: usize,
    ) -> GatewayResult<Vec<ProductCandidate>> {
        // 全文检索按相关度排序，候选打分在引擎层完成
        let terms: String = title
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let terms = terms.split_whitespace().collect::<Vec<_>>().join(" ");
        self.products_matching(terms, limit.max(1)).await
    }

    async fn current_quantity(
        &self,
        inventory_item_id: &str,
        location_id: &str,
    ) -> GatewayResult<Option<i64>> {
        let data: InventoryLevelData = self
            .execute(
                "current_quantity",
                INVENTORY_LEVEL_QUERY,
                json!({ "itemId": inventory_item_id, "locationId": location_id }),
            )
            .await?;

        Ok(data
            .inventory_item
            .and_then(|item| item.inventory_level)
            .and_then(|level| {
                level
                    .quantities
                    .into_iter()
                    .find(|q| q.name == "available")
                    .map(|q| q.quantity)
            }))
    }

    async fn set_quantity(
        &self,
        inventory_item_id: &str,
        location_id: &str,
        quantity: i64,
    ) -> GatewayResult<()> {
        let input = SetQuantitiesInput {
            name: "available",
            reason: "correction",
            ignore_compare_quantity: true,
            quantities: vec![QuantityInput {
                inventory_item_id,
                location_id,
                quantity,
            }],
        };
        let data: SetQuantitiesData = self
            .execute(
                "set_quantity",
                SET_QUANTITIES_MUTATION,
                json!({ "input": input }),
            )
            .await?;

        let user_errors = data
            .inventory_set_quantities
            .map(|payload| payload.user_errors)
            .unwrap_or_default();
        if user_errors.is_empty() {
            Ok(())
        } else {
            let messages: Vec<String> = user_errors.into_iter().map(|e| e.message).collect();
            Err(GatewayError::UserErrors(messages.join("; ")))
        }
    }

    async fn holding_locations(&self, inventory_item_id: &str) -> GatewayResult<Vec<Location>> {
        let data: HoldingLocationsData = self
            .execute(
                "holding_locations",
                HOLDING_LOCATIONS_QUERY,
                json!({ "itemId": inventory_item_id }),
            )
            .await?;

        Ok(data
            .inventory_item
            .map(|item| {
                item.inventory_levels
                    .nodes
                    .into_iter()
                    .map(|level| level.location)
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 搜索语法转义（反斜杠与双引号）
fn escape_search(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn truncate(text: &str, max_chars: usize) -> String {
    let preview: String = text.chars().take(max_chars).collect();
    if preview.len() < text.len() {
        format!("{}...", preview)
    } else {
        preview
    }
}

// ==========================================
// GraphQL 响应结构
// ==========================================
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorItem>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorItem {
    message: String,
    #[serde(default)]
    extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorExtensions {
    code: Option<String>,
}

impl<T> GraphQlResponse<T> {
    fn into_data(self) -> GatewayResult<T> {
        if !self.errors.is_empty() {
            // 查询成本超限以 THROTTLED 返回，按限流处理
            let throttled = self.errors.iter().any(|e| {
                e.extensions
                    .as_ref()
                    .and_then(|ext| ext.code.as_deref())
                    .map(|code| code == "THROTTLED")
                    .unwrap_or(false)
            });
            if throttled {
                return Err(GatewayError::RateLimited { retry_after: None });
            }
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(GatewayError::GraphQl(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| GatewayError::Decode("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LocationsData {
    locations: Nodes<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantsData {
    product_variants: Nodes<VariantDto>,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: Nodes<ProductDto>,
}

#[derive(Debug, Deserialize)]
struct IdDto {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TitleDto {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantDto {
    id: String,
    sku: Option<String>,
    barcode: Option<String>,
    title: String,
    #[serde(default)]
    selected_options: Vec<SelectedOption>,
    inventory_item: IdDto,
    product: TitleDto,
}

impl VariantDto {
    fn into_node(self) -> VariantNode {
        VariantNode {
            id: self.id,
            sku: self.sku.filter(|s| !s.trim().is_empty()),
            barcode: self.barcode.filter(|b| !b.trim().is_empty()),
            title: self.title,
            product_title: self.product.title,
            inventory_item_id: self.inventory_item.id,
            selected_options: self.selected_options,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductDto {
    id: String,
    title: String,
    handle: String,
    variants: Nodes<VariantDto>,
}

impl ProductDto {
    fn into_candidate(self) -> ProductCandidate {
        ProductCandidate {
            id: self.id,
            title: self.title,
            handle: self.handle,
            variants: self
                .variants
                .nodes
                .into_iter()
                .map(VariantDto::into_node)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryLevelData {
    inventory_item: Option<InventoryItemLevelDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryItemLevelDto {
    inventory_level: Option<InventoryLevelDto>,
}

#[derive(Debug, Deserialize)]
struct InventoryLevelDto {
    quantities: Vec<QuantityDto>,
}

#[derive(Debug, Deserialize)]
struct QuantityDto {
    name: String,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldingLocationsData {
    inventory_item: Option<InventoryItemLevelsDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryItemLevelsDto {
    inventory_levels: Nodes<LevelLocationDto>,
}

#[derive(Debug, Deserialize)]
struct LevelLocationDto {
    location: Location,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetQuantitiesInput<'a> {
    name: &'a str,
    reason: &'a str,
    ignore_compare_quantity: bool,
    quantities: Vec<QuantityInput<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuantityInput<'a> {
    inventory_item_id: &'a str,
    location_id: &'a str,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetQuantitiesData {
    inventory_set_quantities: Option<SetQuantitiesPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetQuantitiesPayload {
    #[serde(default)]
    user_errors: Vec<UserErrorDto>,
}

#[derive(Debug, Deserialize)]
struct UserErrorDto {
    message: String,
}
