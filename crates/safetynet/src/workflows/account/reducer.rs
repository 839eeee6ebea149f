use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{AccountState, RiskLevel};
use crate::workflows::tradein::domain::{group_thousands, Pesos};

pub const DUE_DATE_EXTENSION_DAYS: i64 = 3;
pub const SPLIT_PAYMENT_SHARE: f64 = 0.7;
pub const QUEST_REPUTATION_BONUS: u16 = 10;
pub const STORY_REPUTATION_BONUS: u16 = 20;
pub const STORY_POINTS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountEvent {
    ExtendDueDate { loan_id: String },
    SplitPayment { loan_id: String },
    CompleteQuest { quest_id: String },
    StoryChapterCompleted,
    TradeInCompleted { value: Pesos },
}

/// Banner shown to the user after a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
}

impl Notification {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pure account reducer. Events naming an unknown loan or quest leave the state as it was.
pub fn reduce(state: &AccountState, event: AccountEvent) -> (AccountState, Option<Notification>) {
    let mut next = state.clone();

    let notification = match event {
        AccountEvent::ExtendDueDate { loan_id } => {
            match next.loans.iter_mut().find(|loan| loan.id == loan_id) {
                Some(loan) => {
                    loan.next_due_date += Duration::days(DUE_DATE_EXTENSION_DAYS);
                    loan.risk_level = RiskLevel::Low;
                    Some(Notification::new("Due date extended by 3 days! Iwas late fee!"))
                }
                None => None,
            }
        }
        AccountEvent::SplitPayment { loan_id } => {
            match next.loans.iter_mut().find(|loan| loan.id == loan_id) {
                Some(loan) => {
                    loan.installment_amount =
                        (f64::from(loan.installment_amount) * SPLIT_PAYMENT_SHARE).round() as Pesos;
                    loan.risk_level = RiskLevel::Low;
                    Some(Notification::new("Payment split applied. Pay 70% later."))
                }
                None => None,
            }
        }
        AccountEvent::CompleteQuest { quest_id } => {
            match next
                .quests
                .iter_mut()
                .find(|quest| quest.id == quest_id && !quest.completed)
            {
                Some(quest) => {
                    quest.completed = true;
                    let reward = quest.reward_points;
                    next.user.points = next.user.points.saturating_add(reward);
                    next.user.raise_reputation(QUEST_REPUTATION_BONUS);
                    Some(Notification::new(format!("Quest Completed! +{reward} Points")))
                }
                None => None,
            }
        }
        AccountEvent::StoryChapterCompleted => {
            next.user.points = next.user.points.saturating_add(STORY_POINTS);
            next.user.raise_reputation(STORY_REPUTATION_BONUS);
            Some(Notification::new("Story Chapter Complete! +100 XP"))
        }
        AccountEvent::TradeInCompleted { value } => Some(Notification::new(if value > 0 {
            format!("Success! ₱{} Voucher Generated.", group_thousands(value))
        } else {
            "Perks Activated! Check your dashboard.".to_string()
        })),
    };

    if notification.is_none() {
        debug!("account event matched no loan or quest");
        return (state.clone(), None);
    }

    (next, notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::account::domain::LoanStatus;
    use chrono::{TimeZone, Utc};

    fn state() -> AccountState {
        AccountState::demo(
            Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0)
                .single()
                .expect("valid timestamp"),
        )
    }

    #[test]
    fn extending_a_due_date_lowers_risk() {
        let before = state();
        let (after, notice) = reduce(
            &before,
            AccountEvent::ExtendDueDate {
                loan_id: "L-1024".to_string(),
            },
        );
        let loan = after.loan("L-1024").expect("loan present");
        assert_eq!(
            loan.next_due_date,
            before.loan("L-1024").expect("loan present").next_due_date + Duration::days(3)
        );
        assert_eq!(loan.risk_level, RiskLevel::Low);
        assert_eq!(
            notice.map(|n| n.message),
            Some("Due date extended by 3 days! Iwas late fee!".to_string())
        );
    }

    #[test]
    fn splitting_a_payment_keeps_seventy_percent() {
        let (after, _) = reduce(
            &state(),
            AccountEvent::SplitPayment {
                loan_id: "L-1024".to_string(),
            },
        );
        let loan = after.loan("L-1024").expect("loan present");
        assert_eq!(loan.installment_amount, 1_610);
        assert_eq!(loan.status, LoanStatus::Active);
    }

    #[test]
    fn quests_pay_out_once() {
        let event = AccountEvent::CompleteQuest {
            quest_id: "q2".to_string(),
        };
        let (once, notice) = reduce(&state(), event.clone());
        assert_eq!(once.user.points, 450);
        assert_eq!(once.user.reputation_score, 730);
        assert_eq!(
            notice.map(|n| n.message),
            Some("Quest Completed! +100 Points".to_string())
        );

        let (twice, notice) = reduce(&once, event);
        assert_eq!(twice, once);
        assert!(notice.is_none());
    }

    #[test]
    fn story_completion_adds_points_and_reputation() {
        let (after, _) = reduce(&state(), AccountEvent::StoryChapterCompleted);
        assert_eq!(after.user.points, 450);
        assert_eq!(after.user.reputation_score, 740);
    }

    #[test]
    fn reputation_is_capped() {
        let mut start = state();
        start.user.reputation_score = 995;
        let (after, _) = reduce(&start, AccountEvent::StoryChapterCompleted);
        assert_eq!(after.user.reputation_score, 1000);
    }

    #[test]
    fn unknown_loan_is_a_no_op() {
        let before = state();
        let (after, notice) = reduce(
            &before,
            AccountEvent::ExtendDueDate {
                loan_id: "L-404".to_string(),
            },
        );
        assert_eq!(after, before);
        assert!(notice.is_none());
    }

    #[test]
    fn trade_in_notice_depends_on_cash_value() {
        let (_, cash) = reduce(&state(), AccountEvent::TradeInCompleted { value: 11_200 });
        assert_eq!(
            cash.map(|n| n.message),
            Some("Success! ₱11,200 Voucher Generated.".to_string())
        );
        let (_, perks) = reduce(&state(), AccountEvent::TradeInCompleted { value: 0 });
        assert_eq!(
            perks.map(|n| n.message),
            Some("Perks Activated! Check your dashboard.".to_string())
        );
    }
}
