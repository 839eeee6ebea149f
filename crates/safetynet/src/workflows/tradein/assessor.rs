use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    AssessmentSource, DeviceAssessmentRequest, DeviceCategory, DeviceTier, Perk, ScanResult,
};
use super::eligibility::is_trade_in_ready;
use super::valuation::ValuationEngine;
use crate::llm::{decode_json, generate_text, DecodeError, GenerationRequest, LanguageModel, Validate};

/// Outcome of an assessment attempt, tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub source: AssessmentSource,
    pub result: ScanResult,
}

/// Asks the language model first and falls back to the [`ValuationEngine`] on any failure.
pub struct TradeInAssessor {
    engine: ValuationEngine,
    model: Arc<dyn LanguageModel>,
}

impl TradeInAssessor {
    pub fn new(engine: ValuationEngine, model: Arc<dyn LanguageModel>) -> Self {
        Self { engine, model }
    }

    pub fn engine(&self) -> &ValuationEngine {
        &self.engine
    }

    /// Total: transport errors, malformed replies, and replies that contradict local
    /// eligibility all resolve to the deterministic result.
    pub async fn assess(&self, request: &DeviceAssessmentRequest) -> Assessment {
        match self.remote_assessment(request).await {
            Ok(result) => {
                info!(
                    device = %request.display_name(),
                    score = result.device_score,
                    "remote device assessment accepted"
                );
                Assessment {
                    source: AssessmentSource::Remote,
                    result,
                }
            }
            Err(reason) => {
                warn!(
                    device = %request.display_name(),
                    %reason,
                    "remote device assessment unavailable, using valuation fallback"
                );
                Assessment {
                    source: AssessmentSource::Fallback,
                    result: self.engine.assess(request),
                }
            }
        }
    }

    async fn remote_assessment(
        &self,
        request: &DeviceAssessmentRequest,
    ) -> Result<ScanResult, AssessmentFailure> {
        let prompt = assessment_prompt(request);
        let reply = generate_text(self.model.as_ref(), GenerationRequest::json(prompt))
            .await
            .map_err(|err| AssessmentFailure(err.to_string()))?;
        let remote: RemoteScanResult =
            decode_json(&reply).map_err(|err| AssessmentFailure(err.to_string()))?;
        remote
            .reconcile(request)
            .map_err(|err| AssessmentFailure(err.to_string()))
    }
}

#[derive(Debug)]
struct AssessmentFailure(String);

impl std::fmt::Display for AssessmentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteScanResult {
    device_score: i64,
    tier: DeviceTier,
    is_trade_in_ready: bool,
    bundle_name: String,
    perks: Vec<Perk>,
    trade_in_value: f64,
    ai_message: String,
}

impl Validate for RemoteScanResult {
    fn validate(&self) -> Result<(), DecodeError> {
        if !(0..=100).contains(&self.device_score) {
            return Err(DecodeError::invalid(
                "deviceScore",
                format!("{} is outside 0-100", self.device_score),
            ));
        }
        let expected = DeviceTier::from_score(self.device_score as u8);
        if self.tier != expected {
            return Err(DecodeError::invalid(
                "tier",
                format!(
                    "{} does not match score {} ({})",
                    self.tier.label(),
                    self.device_score,
                    expected.label()
                ),
            ));
        }
        if self.bundle_name.trim().is_empty() {
            return Err(DecodeError::invalid("bundleName", "must not be blank"));
        }
        if self.perks.is_empty() {
            return Err(DecodeError::invalid("perks", "at least one perk is required"));
        }
        if !self.trade_in_value.is_finite() || self.trade_in_value < 0.0 {
            return Err(DecodeError::invalid(
                "tradeInValue",
                "must be a non-negative amount",
            ));
        }
        Ok(())
    }
}

impl RemoteScanResult {
    /// Local eligibility stays authoritative over whatever the model claims.
    fn reconcile(self, request: &DeviceAssessmentRequest) -> Result<ScanResult, DecodeError> {
        let ready = is_trade_in_ready(request.contract_id.as_deref());
        if self.is_trade_in_ready != ready {
            return Err(DecodeError::invalid(
                "isTradeInReady",
                format!("expected {ready} for the supplied contract id"),
            ));
        }

        let trade_in_value = self.trade_in_value.round() as u32;
        if request.device_category != DeviceCategory::Smartphone && trade_in_value > 0 {
            return Err(DecodeError::invalid(
                "tradeInValue",
                format!("{} cannot carry a cash value", request.device_category),
            ));
        }

        Ok(ScanResult {
            device_score: self.device_score as u8,
            tier: self.tier,
            is_trade_in_ready: ready,
            bundle_name: self.bundle_name,
            perks: self.perks,
            trade_in_value,
            ai_message: self.ai_message,
        })
    }
}

fn assessment_prompt(request: &DeviceAssessmentRequest) -> String {
    let contract = request
        .contract_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or("Not Verified");

    format!(
        r#"Analyze this device for the "Smart Scan Rewards" (Trade-In Ready) program based on the User's Trust Score.
Device: {device}
Condition: {condition}
User Trust Score: {trust} (Range: 0-1000)
Verified Home Credit Contract ID: {contract}

Reference Pricing Guide (PHP) - Second Hand Buyback Market:
- Flagship Current Gen (e.g. iPhone 15, S24): 40,000 - 55,000
- Flagship Previous Gen (e.g. iPhone 14, S23): 30,000 - 40,000
- Flagship Older (e.g. iPhone 11-13): 12,000 - 25,000
- Mid-Range (e.g. Samsung A54, Xiaomi 13T, Pixel 7): 10,000 - 18,000
- Budget (e.g. Tecno, Infinix, Low-end Samsung): 3,000 - 7,000
- Laptops (MacBook M1/M2): 30,000 - 45,000
- Laptops (Windows Gaming/Ultrabook): 20,000 - 40,000
- Tablets (iPad Pro/Air): 25,000 - 40,000
- Tablets (Budget/Older): 5,000 - 15,000

Logic:
1. Calculate "deviceScore" (0-100) based on desirability and condition.
2. Assign "tier": 'Essential' (<50), 'Bonus' (50-79), or 'Premium' (80+).
3. Set "isTradeInReady" to true ONLY if a Verified Home Credit Contract ID is present (not "Not Verified").
4. Pick the perk bundle from the Trust Score:
   - High Trust (>700): aggressive VIP perks such as "0% Interest on Qwarta", "Waived Last Installment", "Approval Boost (2x)". Bundle names like "VIP Trust Bundle".
   - Medium Trust (400-700): balanced perks such as "1% Interest Rebate", "500 Reward Points", "Free Device Insurance". Bundle names like "Smart Saver Bundle".
   - Low Trust (<400): safety perks such as "SafePay Bonus", "Device Care Badge", "Application Fee Discount", "Free Financial Checkup". Bundle names like "Trust Builder Set".
5. Estimate "tradeInValue" in PHP from the guide, reduced to 80% for 'Good' and 60% for 'Fair'. If the device is NOT a Smartphone, tradeInValue MUST be 0.

Return JSON ONLY matching this interface:
{{
  "deviceScore": number,
  "tier": "Essential" | "Bonus" | "Premium",
  "isTradeInReady": boolean,
  "bundleName": "string",
  "perks": [{{ "id": "1", "title": "string", "description": "string", "type": "discount" | "boost" | "points" | "terms", "value": "string" }}],
  "tradeInValue": number,
  "aiMessage": "One sentence explaining why this bundle fits their trust level."
}}"#,
        device = request.display_name(),
        condition = request.condition.label(),
        trust = request.trust_score,
    )
}
