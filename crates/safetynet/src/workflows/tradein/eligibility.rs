use super::domain::{DeviceCategory, Pesos};

/// Only handsets are accepted for a physical trade-in; everything else is perk-only.
pub fn compute_trade_in_value(category: DeviceCategory, adjusted_price: Pesos) -> Pesos {
    match category {
        DeviceCategory::Smartphone => adjusted_price,
        DeviceCategory::Tablet | DeviceCategory::Laptop => 0,
    }
}

/// Trade-in readiness requires a verified contract id, independent of device condition.
pub fn is_trade_in_ready(contract_id: Option<&str>) -> bool {
    contract_id
        .map(|id| !id.trim().is_empty())
        .unwrap_or(false)
}
