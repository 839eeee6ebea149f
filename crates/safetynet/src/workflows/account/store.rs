use std::sync::Mutex;

use serde::Serialize;
use tracing::info;

use super::domain::{AccountState, Reward};
use super::reducer::{reduce, AccountEvent, Notification};
use crate::workflows::tradein::repository::{CompletionSink, CompletionSinkError};
use crate::workflows::tradein::wizard::{CompletionEvent, WizardContext};

/// Single-user account held in memory. Every mutation goes through [`reduce`].
pub struct AccountStore {
    state: Mutex<AccountState>,
    notifications: Mutex<Vec<Notification>>,
}

/// Account snapshot returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[serde(flatten)]
    pub state: AccountState,
    pub has_completed_loan: bool,
}

impl AccountStore {
    pub fn new(state: AccountState) -> Self {
        Self {
            state: Mutex::new(state),
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> AccountState {
        self.state.lock().expect("account mutex poisoned").clone()
    }

    pub fn view(&self) -> AccountView {
        let state = self.snapshot();
        AccountView {
            has_completed_loan: state.has_completed_loan(),
            state,
        }
    }

    pub fn rewards(&self) -> Vec<Reward> {
        self.snapshot().rewards()
    }

    /// Facts the trade-in wizard needs when a session opens.
    pub fn wizard_context(&self) -> (WizardContext, bool) {
        let state = self.snapshot();
        let context = WizardContext {
            trust_score: state.user.reputation_score,
            level: state.user.level,
        };
        (context, state.has_completed_loan())
    }

    pub fn apply(&self, event: AccountEvent) -> (AccountState, Option<Notification>) {
        let mut guard = self.state.lock().expect("account mutex poisoned");
        let (next, notification) = reduce(&guard, event);
        *guard = next.clone();
        drop(guard);

        if let Some(notice) = &notification {
            info!(message = %notice.message, "account notification");
            self.notifications
                .lock()
                .expect("notification mutex poisoned")
                .push(notice.clone());
        }
        (next, notification)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl CompletionSink for AccountStore {
    fn publish(&self, event: CompletionEvent) -> Result<(), CompletionSinkError> {
        self.apply(AccountEvent::TradeInCompleted {
            value: event.value(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn completion_events_become_notifications() {
        let store = AccountStore::new(AccountState::demo(Utc::now()));
        store
            .publish(CompletionEvent::CashVoucher { value: 9_600 })
            .expect("publish succeeds");
        store
            .publish(CompletionEvent::PerkActivated {
                perk_id: "2".to_string(),
            })
            .expect("publish succeeds");

        let messages: Vec<_> = store
            .notifications()
            .into_iter()
            .map(|notice| notice.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Success! ₱9,600 Voucher Generated.".to_string(),
                "Perks Activated! Check your dashboard.".to_string(),
            ]
        );
    }

    #[test]
    fn wizard_context_reflects_current_profile() {
        let store = AccountStore::new(AccountState::demo(Utc::now()));
        store.apply(AccountEvent::StoryChapterCompleted);
        let (context, unlocked) = store.wizard_context();
        assert_eq!(context.trust_score, 740);
        assert!(unlocked);
    }
}
