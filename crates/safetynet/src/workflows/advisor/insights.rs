//! Structured model replies: price-tag affordability and upgrade timing.

use serde::{Deserialize, Serialize};

use crate::llm::{DecodeError, Validate};
use crate::workflows::account::LoyaltyLevel;
use crate::workflows::tradein::domain::Pesos;

/// Flat add-on applied by the offline installment estimate.
pub const FALLBACK_INTEREST: f64 = 1.05;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affordability {
    #[serde(rename = "installment6mo")]
    pub installment_6mo: Pesos,
    #[serde(rename = "installment12mo")]
    pub installment_12mo: Pesos,
    pub analysis: String,
    pub sales_pitch: String,
}

impl Affordability {
    pub fn fallback(price: Pesos, level: LoyaltyLevel) -> Self {
        let installment_12mo = estimate_installment(price, 12);
        Self {
            installment_6mo: estimate_installment(price, 6),
            installment_12mo,
            analysis: "Looks like a great item!".to_string(),
            sales_pitch: sales_pitch(price, level, installment_12mo),
        }
    }
}

pub fn estimate_installment(price: Pesos, months: u32) -> Pesos {
    (f64::from(price) / f64::from(months) * FALLBACK_INTEREST).round() as Pesos
}

pub fn sales_pitch(price: Pesos, level: LoyaltyLevel, monthly: Pesos) -> String {
    format!(
        "We found a price of ₱{price}. Based on your {} Tier, you can take this home today for only ₱{monthly}/month. Show this screen to a Home Credit agent nearby!",
        level.label()
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoteAffordability {
    #[serde(rename = "installment6mo")]
    installment_6mo: f64,
    #[serde(rename = "installment12mo")]
    installment_12mo: f64,
    analysis: String,
    sales_pitch: String,
}

impl Validate for RemoteAffordability {
    fn validate(&self) -> Result<(), DecodeError> {
        for (field, amount) in [
            ("installment6mo", self.installment_6mo),
            ("installment12mo", self.installment_12mo),
        ] {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(DecodeError::invalid(field, "must be a positive amount"));
            }
        }
        if self.installment_12mo > self.installment_6mo {
            return Err(DecodeError::invalid(
                "installment12mo",
                "a longer term cannot cost more per month",
            ));
        }
        if self.sales_pitch.trim().is_empty() {
            return Err(DecodeError::invalid("salesPitch", "must not be blank"));
        }
        Ok(())
    }
}

impl From<RemoteAffordability> for Affordability {
    fn from(remote: RemoteAffordability) -> Self {
        Self {
            installment_6mo: remote.installment_6mo.round() as Pesos,
            installment_12mo: remote.installment_12mo.round() as Pesos,
            analysis: remote.analysis,
            sales_pitch: remote.sales_pitch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradePrediction {
    pub should_upgrade: bool,
    pub urgency: Urgency,
    pub reason: String,
    /// Month-on-month value drop, e.g. `"3%"`.
    pub projected_drop: String,
}

impl UpgradePrediction {
    pub fn fallback() -> Self {
        Self {
            should_upgrade: true,
            urgency: Urgency::Medium,
            reason: "Model value is stabilizing.".to_string(),
            projected_drop: "3%".to_string(),
        }
    }
}

impl Validate for UpgradePrediction {
    fn validate(&self) -> Result<(), DecodeError> {
        if self.reason.trim().is_empty() {
            return Err(DecodeError::invalid("reason", "must not be blank"));
        }
        let drop = self.projected_drop.trim();
        let percent = drop
            .strip_suffix('%')
            .and_then(|number| number.trim().parse::<f64>().ok());
        match percent {
            Some(value) if (0.0..=100.0).contains(&value) => Ok(()),
            _ => Err(DecodeError::invalid(
                "projectedDrop",
                format!("`{drop}` is not a percentage"),
            )),
        }
    }
}
