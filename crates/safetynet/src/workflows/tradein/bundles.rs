use super::domain::{Perk, PerkKind};
use serde::{Deserialize, Serialize};

/// Trust-score band that decides how aggressive the perk bundle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustBand {
    Low,
    Medium,
    High,
}

impl TrustBand {
    /// `> 700` is high, `400..=700` medium, below 400 low.
    pub const fn from_score(trust_score: u16) -> Self {
        if trust_score > 700 {
            Self::High
        } else if trust_score >= 400 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Trust",
            Self::Medium => "Medium Trust",
            Self::High => "High Trust",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    pub band: TrustBand,
    pub name: &'static str,
    pub perks: Vec<Perk>,
}

pub fn select_bundle(trust_score: u16) -> Bundle {
    let band = TrustBand::from_score(trust_score);
    match band {
        TrustBand::High => Bundle {
            band,
            name: "VIP Trust Bundle",
            perks: vec![
                Perk::new(
                    "1",
                    "0% Interest on Qwarta",
                    "Valid for your next Qwarta purchase.",
                    PerkKind::Discount,
                    "Save ~₱800",
                ),
                Perk::new(
                    "2",
                    "Waived Last Installment",
                    "Finish your term on time and we cover the final month.",
                    PerkKind::Terms,
                    "1 month free",
                ),
                Perk::new(
                    "3",
                    "Approval Boost (2x)",
                    "Priority review on your next cash loan application.",
                    PerkKind::Boost,
                    "2x faster",
                ),
            ],
        },
        TrustBand::Medium => Bundle {
            band,
            name: "Smart Saver Bundle",
            perks: vec![
                Perk::new(
                    "1",
                    "1% Interest Rebate",
                    "Rebate credited after your next three on-time payments.",
                    PerkKind::Discount,
                    "1% Off",
                ),
                Perk::new(
                    "2",
                    "500 Reward Points",
                    "Added to your rewards balance once activated.",
                    PerkKind::Points,
                    "+500 Pts",
                ),
                Perk::new(
                    "3",
                    "Free Device Insurance",
                    "Three months of screen and theft cover.",
                    PerkKind::Terms,
                    "3 months",
                ),
            ],
        },
        TrustBand::Low => Bundle {
            band,
            name: "Trust Builder Set",
            perks: vec![
                Perk::new(
                    "1",
                    "SafePay Bonus",
                    "Earn points for every on-time payment this quarter.",
                    PerkKind::Points,
                    "+100 Pts / payment",
                ),
                Perk::new(
                    "2",
                    "Application Fee Discount",
                    "Reduced processing fee on your next application.",
                    PerkKind::Discount,
                    "Save ₱200",
                ),
                Perk::new(
                    "3",
                    "Free Financial Checkup",
                    "A guided budget review with your AI mentor.",
                    PerkKind::Boost,
                    "Free",
                ),
            ],
        },
    }
}
