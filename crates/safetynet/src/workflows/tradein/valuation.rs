use super::bundles::select_bundle;
use super::domain::{DeviceAssessmentRequest, DeviceTier, Pesos, ScanResult};
use super::eligibility::{compute_trade_in_value, is_trade_in_ready};
use super::pricing::{adjust_for_condition, PriceTable};

pub const FALLBACK_MESSAGE: &str =
    "Based on our market data, this device holds strong value for a trade-in.";

/// Deterministic valuation used whenever the remote assessment is unavailable.
#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    prices: PriceTable,
}

impl ValuationEngine {
    pub fn new(prices: PriceTable) -> Self {
        Self { prices }
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Never fails: unknown models price at the table default.
    pub fn assess(&self, request: &DeviceAssessmentRequest) -> ScanResult {
        let base = self.prices.base_price(&request.model_name);
        let adjusted = adjust_for_condition(base, request.condition);
        let device_score = device_score_for_price(adjusted);
        let bundle = select_bundle(request.trust_score);

        ScanResult {
            device_score,
            tier: DeviceTier::from_score(device_score),
            is_trade_in_ready: is_trade_in_ready(request.contract_id.as_deref()),
            bundle_name: bundle.name.to_string(),
            perks: bundle.perks,
            trade_in_value: compute_trade_in_value(request.device_category, adjusted),
            ai_message: FALLBACK_MESSAGE.to_string(),
        }
    }
}

pub fn device_score_for_price(adjusted_price: Pesos) -> u8 {
    if adjusted_price > 20_000 {
        92
    } else if adjusted_price > 10_000 {
        75
    } else {
        45
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tradein::domain::{DeviceCategory, DeviceCondition};

    fn request(
        category: DeviceCategory,
        model: &str,
        condition: DeviceCondition,
        trust_score: u16,
        contract_id: Option<&str>,
    ) -> DeviceAssessmentRequest {
        DeviceAssessmentRequest::new(
            category,
            model,
            condition,
            trust_score,
            contract_id.map(str::to_string),
        )
    }

    #[test]
    fn laptop_in_excellent_condition_is_premium_without_cash_value() {
        let engine = ValuationEngine::default();
        let result = engine.assess(&request(
            DeviceCategory::Laptop,
            "MacBook Air M2",
            DeviceCondition::Excellent,
            720,
            Some("C1"),
        ));

        assert_eq!(result.device_score, 92);
        assert_eq!(result.tier, DeviceTier::Premium);
        assert_eq!(result.trade_in_value, 0);
        assert!(result.is_trade_in_ready);
        assert_eq!(result.bundle_name, "VIP Trust Bundle");
    }

    #[test]
    fn smartphone_value_follows_condition() {
        let engine = ValuationEngine::default();
        let result = engine.assess(&request(
            DeviceCategory::Smartphone,
            "Samsung Galaxy A54",
            DeviceCondition::Good,
            550,
            None,
        ));

        assert_eq!(result.trade_in_value, 11_200);
        assert_eq!(result.device_score, 75);
        assert_eq!(result.tier, DeviceTier::Bonus);
        assert!(!result.is_trade_in_ready);
        assert_eq!(result.bundle_name, "Smart Saver Bundle");
    }

    #[test]
    fn score_uses_adjusted_price() {
        let engine = ValuationEngine::default();
        // 24000 base drops to 14400 in Fair condition.
        let result = engine.assess(&request(
            DeviceCategory::Smartphone,
            "Google Pixel 8",
            DeviceCondition::Fair,
            300,
            Some(" "),
        ));
        assert_eq!(result.trade_in_value, 14_400);
        assert_eq!(result.device_score, 75);
        assert!(!result.is_trade_in_ready);
        assert_eq!(result.bundle_name, "Trust Builder Set");
    }

    #[test]
    fn unknown_device_lands_in_essential_tier() {
        let engine = ValuationEngine::default();
        let result = engine.assess(&request(
            DeviceCategory::Smartphone,
            "Nokia 3310",
            DeviceCondition::Excellent,
            500,
            Some("C9"),
        ));
        assert_eq!(result.trade_in_value, 4_000);
        assert_eq!(result.device_score, 45);
        assert_eq!(result.tier, DeviceTier::Essential);
    }

    #[test]
    fn non_smartphones_never_carry_cash_value() {
        let engine = ValuationEngine::default();
        for category in [DeviceCategory::Tablet, DeviceCategory::Laptop] {
            for condition in [
                DeviceCondition::Excellent,
                DeviceCondition::Good,
                DeviceCondition::Fair,
            ] {
                for model in ["iPad Pro", "MacBook Pro 14", "iPhone 15 Pro Max", "unknown"] {
                    let result =
                        engine.assess(&request(category, model, condition, 650, Some("C1")));
                    assert_eq!(result.trade_in_value, 0, "{category} {model} {condition}");
                }
            }
        }
    }

    #[test]
    fn assessment_is_idempotent() {
        let engine = ValuationEngine::default();
        let req = request(
            DeviceCategory::Smartphone,
            "iPhone 14 Pro",
            DeviceCondition::Good,
            701,
            Some("230012999"),
        );
        assert_eq!(engine.assess(&req), engine.assess(&req));
    }

    #[test]
    fn score_thresholds_are_strict() {
        assert_eq!(device_score_for_price(20_001), 92);
        assert_eq!(device_score_for_price(20_000), 75);
        assert_eq!(device_score_for_price(10_001), 75);
        assert_eq!(device_score_for_price(10_000), 45);
        assert_eq!(device_score_for_price(0), 45);
    }
}
