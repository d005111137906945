// ==========================================
// 库存对账同步 - 位置解析器
// ==========================================
// 顺序:
// 1. 行内指定位置名 → 名称映射（大小写不敏感）；未映射即失败
// 2. 店铺仅有一个位置 → 直接使用
// 3. 当前持有该库存项的位置恰好一个 → 使用
// 4. 配置的默认位置名 → 同样按名称映射
// 5. 其余情况失败，原因需可操作
// ==========================================

use crate::domain::{Location, ParsedRow};
use crate::gateway::{CatalogGateway, GatewayResult};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationResolution {
    Resolved(Location),
    Unresolved(String),
}

/// 单次运行内只读，批内并发共享
#[derive(Debug, Clone)]
pub struct LocationResolver {
    locations: Vec<Location>,
    by_name: HashMap<String, usize>,
    default_location_name: Option<String>,
}

impl LocationResolver {
    pub fn new(locations: Vec<Location>, default_location_name: Option<String>) -> Self {
        let mut by_name = HashMap::with_capacity(locations.len());
        for (index, location) in locations.iter().enumerate() {
            // 同名位置保留第一个
            by_name
                .entry(location.name.trim().to_lowercase())
                .or_insert(index);
        }
        Self {
            locations,
            by_name,
            default_location_name: default_location_name.filter(|n| !n.trim().is_empty()),
        }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// 按名称查找（大小写不敏感精确匹配）
    pub fn find_by_name(&self, name: &str) -> Option<&Location> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|&index| &self.locations[index])
    }

    fn available_names(&self) -> String {
        if self.locations.is_empty() {
            return "none".to_string();
        }
        self.locations
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn map_name(&self, name: &str, label: &str) -> LocationResolution {
        match self.find_by_name(name) {
            Some(location) => LocationResolution::Resolved(location.clone()),
            None => LocationResolution::Unresolved(format!(
                "{} \"{}\" not found in the shop (available: {})",
                label,
                name.trim(),
                self.available_names()
            )),
        }
    }

    /// 解析行的目标位置
    ///
    /// # 参数
    /// - row: 待同步行
    /// - inventory_item_id: 已解析的库存项（用于查询持有位置）
    pub async fn resolve(
        &self,
        row: &ParsedRow,
        inventory_item_id: &str,
        gateway: &dyn CatalogGateway,
    ) -> GatewayResult<LocationResolution> {
        if let Some(name) = row
            .location_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
        {
            return Ok(self.map_name(name, "Location"));
        }

        if self.locations.len() == 1 {
            return Ok(LocationResolution::Resolved(self.locations[0].clone()));
        }

        let mut holding = gateway.holding_locations(inventory_item_id).await?;
        if holding.len() == 1 {
            return Ok(LocationResolution::Resolved(holding.remove(0)));
        }

        if let Some(default_name) = &self.default_location_name {
            return Ok(self.map_name(default_name, "Default location"));
        }

        let reason = if holding.is_empty() {
            "No location given and the item is not stocked at any location; add a location column or configure a default location".to_string()
        } else {
            format!(
                "No location given and the item is stocked at multiple locations ({}); add a location column or configure a default location",
                holding
                    .iter()
                    .map(|l| l.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        Ok(LocationResolution::Unresolved(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str, name: &str) -> Location {
        Location {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let resolver = LocationResolver::new(
            vec![location("1", "Main Warehouse"), location("2", "Retail Store")],
            None,
        );
        assert_eq!(
            resolver.find_by_name("  main warehouse ").map(|l| l.id.as_str()),
            Some("1")
        );
        assert!(resolver.find_by_name("Main").is_none());
    }

    #[test]
    fn test_unmapped_name_lists_available() {
        let resolver = LocationResolver::new(
            vec![location("1", "Main Warehouse"), location("2", "Retail Store")],
            None,
        );
        match resolver.map_name("Backroom", "Location") {
            LocationResolution::Unresolved(reason) => {
                assert_eq!(
                    reason,
                    "Location \"Backroom\" not found in the shop (available: Main Warehouse, Retail Store)"
                );
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_blank_default_is_ignored() {
        let resolver = LocationResolver::new(vec![], Some("  ".to_string()));
        assert!(resolver.default_location_name.is_none());
        assert_eq!(resolver.available_names(), "none");
    }
}
