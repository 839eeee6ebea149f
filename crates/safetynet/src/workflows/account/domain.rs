use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::tradein::domain::{Pesos, MAX_TRUST_SCORE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LoyaltyLevel {
    Bronze,
    #[default]
    Silver,
    Gold,
    Platinum,
    #[serde(rename = "VIP")]
    Vip,
}

impl LoyaltyLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Vip => "VIP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    /// Trust score, 0..=1000.
    pub reputation_score: u16,
    pub level: LoyaltyLevel,
    pub points: u32,
    pub streak_months: u32,
}

impl UserProfile {
    pub(crate) fn raise_reputation(&mut self, by: u16) {
        self.reputation_score = self.reputation_score.saturating_add(by).min(MAX_TRUST_SCORE);
    }

    /// Context line handed to the mentor with every chat turn.
    pub fn mentor_context(&self) -> String {
        format!(
            "User Level: {}, Reputation: {}. The user is conscientious but sometimes worries about cash flow.",
            self.level.label(),
            self.reputation_score
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Paid,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub principal: Pesos,
    pub interest: Pesos,
    pub insurance: Pesos,
    pub late_fees: Pesos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Pesos,
    pub remaining_amount: Pesos,
    pub next_due_date: DateTime<Utc>,
    pub installment_amount: Pesos,
    pub breakdown: Breakdown,
    pub risk_level: RiskLevel,
    pub status: LoanStatus,
}

impl Loan {
    /// One-line summary used when asking the mentor for a risk tip.
    pub fn risk_summary(&self) -> String {
        format!(
            "{} {}: ₱{} remaining, next installment ₱{} due {}, risk {:?}",
            self.kind,
            self.id,
            self.remaining_amount,
            self.installment_amount,
            self.next_due_date.format("%Y-%m-%d"),
            self.risk_level
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub reward_points: u32,
    pub completed: bool,
    pub action_route: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub cost: u32,
    pub description: String,
    pub unlocked: bool,
}

const REWARD_CATALOGUE: &[(&str, &str, u32, &str)] = &[
    (
        "1",
        "Last Installment FREE",
        2500,
        "The ultimate reward! We pay your last month if you finish your term on time.",
    ),
    (
        "2",
        "Waived Processing Fee",
        1200,
        "Save ~₱500-₱1,000 on fees when you apply for your next Cash Loan.",
    ),
    (
        "3",
        "₱500 SM Gift Pass",
        800,
        "Shop at The SM Store, Supermarket, and affiliates nationwide.",
    ),
    (
        "4",
        "0% Interest Qwarta",
        600,
        "Unlock 0% interest for 1 month on your Qwarta credit line purchases.",
    ),
    (
        "5",
        "Grace Pass (3 Days)",
        300,
        "SafetyNet exclusive: Extend a due date without penalty fees.",
    ),
    (
        "6",
        "₱100 GCash Load",
        150,
        "Instant load for your prepaid mobile or wallet.",
    ),
];

/// Reward catalogue with `unlocked` evaluated against the given balance.
pub fn reward_catalogue(points: u32) -> Vec<Reward> {
    REWARD_CATALOGUE
        .iter()
        .map(|(id, title, cost, description)| Reward {
            id: (*id).to_string(),
            title: (*title).to_string(),
            cost: *cost,
            description: (*description).to_string(),
            unlocked: points >= *cost,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub user: UserProfile,
    pub loans: Vec<Loan>,
    pub quests: Vec<Quest>,
}

impl AccountState {
    /// Seed account used by the demo server: one active loan, one paid off.
    pub fn demo(now: DateTime<Utc>) -> Self {
        Self {
            user: UserProfile {
                name: "Alex".to_string(),
                reputation_score: 720,
                level: LoyaltyLevel::Silver,
                points: 350,
                streak_months: 4,
            },
            loans: vec![
                Loan {
                    id: "L-1024".to_string(),
                    kind: "Cash Loan".to_string(),
                    amount: 15_000,
                    remaining_amount: 4_500,
                    next_due_date: now + Duration::days(3),
                    installment_amount: 2_300,
                    breakdown: Breakdown {
                        principal: 1_800,
                        interest: 350,
                        insurance: 150,
                        late_fees: 0,
                    },
                    risk_level: RiskLevel::Medium,
                    status: LoanStatus::Active,
                },
                Loan {
                    id: "L-0099".to_string(),
                    kind: "Smartphone Loan".to_string(),
                    amount: 12_000,
                    remaining_amount: 0,
                    next_due_date: now - Duration::days(30),
                    installment_amount: 0,
                    breakdown: Breakdown::default(),
                    risk_level: RiskLevel::Low,
                    status: LoanStatus::Paid,
                },
            ],
            quests: vec![
                Quest {
                    id: "q2".to_string(),
                    title: "Unlock Device Perks".to_string(),
                    description: "Scan your gadget to see rewards.".to_string(),
                    reward_points: 100,
                    completed: false,
                    action_route: "tradein".to_string(),
                },
                Quest {
                    id: "q3".to_string(),
                    title: "Play \"Financial Quest\"".to_string(),
                    description: "Complete a story chapter.".to_string(),
                    reward_points: 150,
                    completed: false,
                    action_route: "story".to_string(),
                },
            ],
        }
    }

    /// Trade-in is unlocked once any loan has been paid off.
    pub fn has_completed_loan(&self) -> bool {
        self.loans.iter().any(|loan| loan.status == LoanStatus::Paid)
    }

    pub fn rewards(&self) -> Vec<Reward> {
        reward_catalogue(self.user.points)
    }

    pub fn loan(&self, loan_id: &str) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.id == loan_id)
    }
}
