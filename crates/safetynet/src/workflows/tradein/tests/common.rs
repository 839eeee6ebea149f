use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::llm::{GenerationRequest, LanguageModel, ModelError};
use crate::workflows::account::{AccountState, AccountStore, LoanStatus, LoyaltyLevel};
use crate::workflows::advisor::Advisor;
use crate::workflows::tradein::repository::{
    CompletionSink, CompletionSinkError, SessionId, SessionRepository, SessionRepositoryError,
    TradeInSession,
};
use crate::workflows::tradein::{
    CompletionEvent, DeviceCategory, DeviceCondition, DeviceScanner, ScanMode, TradeInAssessor,
    TradeInService, UserAction, ValuationEngine, WizardContext, WizardEvent, WizardState,
};

pub(super) fn context(trust_score: u16) -> WizardContext {
    WizardContext {
        trust_score,
        level: LoyaltyLevel::Silver,
    }
}

/// Actions that fill every required field for a self-scanned smartphone.
pub(super) fn complete_form(model: &str, contract_id: &str) -> Vec<UserAction> {
    vec![
        UserAction::SelectCategory {
            category: DeviceCategory::Smartphone,
        },
        UserAction::SelectScanMode {
            mode: ScanMode::SelfScan,
        },
        UserAction::SetModel {
            model: model.to_string(),
        },
        UserAction::SetCondition {
            condition: DeviceCondition::Good,
        },
        UserAction::SetSerialNumber {
            serial_number: "SN-12345".to_string(),
        },
        UserAction::SetContractId {
            contract_id: contract_id.to_string(),
        },
        UserAction::AttachReceipt {
            file_name: "receipt.jpg".to_string(),
        },
    ]
}

/// Folds user actions through the pure state machine, panicking on rejection.
pub(super) fn drive(
    mut state: WizardState,
    context: &WizardContext,
    actions: Vec<UserAction>,
) -> WizardState {
    for action in actions {
        let name = action.name();
        state = crate::workflows::tradein::transition(&state, context, WizardEvent::User(action))
            .unwrap_or_else(|err| panic!("{name} rejected: {err}"))
            .state;
    }
    state
}

/// Model that returns the same reply (or error) for every call and counts calls.
pub(super) struct ScriptedModel {
    reply: Result<String, String>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedModel {
    pub(super) fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().expect("call log mutex poisoned").clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError> {
        self.calls
            .lock()
            .expect("call log mutex poisoned")
            .push(request);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(ModelError::Transport(reason.clone())),
        }
    }
}

/// Model that never answers within any reasonable deadline.
pub(super) struct StalledModel;

#[async_trait]
impl LanguageModel for StalledModel {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, ModelError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ModelError::EmptyResponse)
    }
}

pub(super) fn remote_scan_json(score: u8, tier: &str, ready: bool, value: u32) -> String {
    serde_json::json!({
        "deviceScore": score,
        "tier": tier,
        "isTradeInReady": ready,
        "bundleName": "Loyalty Booster Pack",
        "perks": [
            { "id": "p1", "title": "500 Reward Points", "description": "Added after activation.", "type": "points", "value": "+500 Pts" },
            { "id": "p2", "title": "Free Device Insurance", "description": "Three months of cover.", "type": "terms", "value": "3 months" }
        ],
        "tradeInValue": value,
        "aiMessage": "Your steady payments earn a balanced bundle."
    })
    .to_string()
}

#[derive(Default, Clone)]
pub(super) struct MemorySessions {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, TradeInSession>>>,
}

impl SessionRepository for MemorySessions {
    fn insert(&self, session: TradeInSession) -> Result<TradeInSession, SessionRepositoryError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(SessionRepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: TradeInSession) -> Result<(), SessionRepositoryError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<TradeInSession>, SessionRepositoryError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct UnavailableSessions;

impl SessionRepository for UnavailableSessions {
    fn insert(&self, _session: TradeInSession) -> Result<TradeInSession, SessionRepositoryError> {
        Err(SessionRepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _session: TradeInSession) -> Result<(), SessionRepositoryError> {
        Err(SessionRepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<TradeInSession>, SessionRepositoryError> {
        Err(SessionRepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    events: Arc<Mutex<Vec<CompletionEvent>>>,
}

impl MemorySink {
    pub(super) fn events(&self) -> Vec<CompletionEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

impl CompletionSink for MemorySink {
    fn publish(&self, event: CompletionEvent) -> Result<(), CompletionSinkError> {
        self.events.lock().expect("sink mutex poisoned").push(event);
        Ok(())
    }
}

pub(super) fn build_service(
    model: Arc<dyn LanguageModel>,
) -> (
    TradeInService<MemorySessions, MemorySink>,
    Arc<MemorySessions>,
    Arc<MemorySink>,
) {
    let repository = Arc::new(MemorySessions::default());
    let sink = Arc::new(MemorySink::default());
    let service = TradeInService::new(
        repository.clone(),
        sink.clone(),
        Arc::new(TradeInAssessor::new(ValuationEngine::default(), model.clone())),
        Arc::new(Advisor::new(model)),
        Arc::new(DeviceScanner::seeded(Duration::ZERO, 7)),
    );
    (service, repository, sink)
}

pub(super) fn demo_account() -> Arc<AccountStore> {
    Arc::new(AccountStore::new(AccountState::demo(Utc::now())))
}

pub(super) fn locked_account() -> Arc<AccountStore> {
    let mut state = AccountState::demo(Utc::now());
    for loan in &mut state.loans {
        loan.status = LoanStatus::Active;
    }
    Arc::new(AccountStore::new(state))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
