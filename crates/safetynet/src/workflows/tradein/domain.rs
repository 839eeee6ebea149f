use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_TRUST_SCORE: u16 = 1000;

/// Whole Philippine pesos.
pub type Pesos = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeviceCategory {
    #[default]
    Smartphone,
    Tablet,
    Laptop,
}

impl DeviceCategory {
    pub const fn ordered() -> [Self; 3] {
        [Self::Smartphone, Self::Tablet, Self::Laptop]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Smartphone => "Smartphone",
            Self::Tablet => "Tablet",
            Self::Laptop => "Laptop",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeviceCondition {
    Excellent,
    #[default]
    Good,
    Fair,
}

impl DeviceCondition {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }

    /// Share of the excellent-condition price retained.
    pub const fn retention(self) -> f64 {
        match self {
            Self::Excellent => 1.0,
            Self::Good => 0.8,
            Self::Fair => 0.6,
        }
    }
}

impl fmt::Display for DeviceCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Peso amount with comma thousands separators, e.g. `11,200`.
pub fn group_thousands(value: Pesos) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Resale desirability band derived from the device score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceTier {
    Essential,
    Bonus,
    Premium,
}

impl DeviceTier {
    pub const fn from_score(score: u8) -> Self {
        match score {
            0..=49 => Self::Essential,
            50..=79 => Self::Bonus,
            _ => Self::Premium,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Essential => "Essential",
            Self::Bonus => "Bonus",
            Self::Premium => "Premium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerkKind {
    Discount,
    Boost,
    Points,
    Terms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perk {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PerkKind,
    pub value: String,
}

impl Perk {
    pub fn new(id: &str, title: &str, description: &str, kind: PerkKind, value: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            kind,
            value: value.to_string(),
        }
    }
}

/// Snapshot submitted for valuation. Trust scores above 1000 are clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAssessmentRequest {
    pub device_category: DeviceCategory,
    pub model_name: String,
    pub condition: DeviceCondition,
    pub trust_score: u16,
    #[serde(default)]
    pub contract_id: Option<String>,
}

impl DeviceAssessmentRequest {
    pub fn new(
        device_category: DeviceCategory,
        model_name: impl Into<String>,
        condition: DeviceCondition,
        trust_score: u16,
        contract_id: Option<String>,
    ) -> Self {
        Self {
            device_category,
            model_name: model_name.into(),
            condition,
            trust_score: trust_score.min(MAX_TRUST_SCORE),
            contract_id,
        }
    }

    /// Category-qualified name shown to the model, e.g. `"Laptop MacBook Air M2"`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.device_category.label(), self.model_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub device_score: u8,
    pub tier: DeviceTier,
    pub is_trade_in_ready: bool,
    pub bundle_name: String,
    pub perks: Vec<Perk>,
    pub trade_in_value: Pesos,
    pub ai_message: String,
}

impl ScanResult {
    pub fn perk(&self, perk_id: &str) -> Option<&Perk> {
        self.perks.iter().find(|perk| perk.id == perk_id)
    }
}

/// Where an assessment result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentSource {
    Remote,
    Fallback,
}
