use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wizard::{CompletionEvent, RequiredField, WizardContext, WizardState, WizardStep};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored wizard session: the caller context plus the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeInSession {
    pub id: SessionId,
    pub context: WizardContext,
    pub state: WizardState,
    /// User-facing messages raised by `Notify` effects, oldest first.
    pub notices: Vec<String>,
    pub completions: Vec<CompletionEvent>,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TradeInSession {
    pub fn step(&self) -> WizardStep {
        self.state.step()
    }

    pub fn view(&self) -> SessionView {
        let form = self.state.form();
        SessionView {
            id: self.id.clone(),
            step: self.step(),
            missing_fields: form.missing_fields(),
            state: self.state.clone(),
            notices: self.notices.clone(),
            completions: self.completions.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Session representation returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: SessionId,
    pub step: WizardStep,
    /// Fields still blocking submission; empty once the form can be submitted.
    pub missing_fields: Vec<RequiredField>,
    pub state: WizardState,
    pub notices: Vec<String>,
    pub completions: Vec<CompletionEvent>,
    pub updated_at: DateTime<Utc>,
}

/// Storage abstraction for wizard sessions.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: TradeInSession) -> Result<TradeInSession, SessionRepositoryError>;
    fn update(&self, session: TradeInSession) -> Result<(), SessionRepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<TradeInSession>, SessionRepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionRepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Receives perk activations and cash vouchers raised from the results step.
pub trait CompletionSink: Send + Sync {
    fn publish(&self, event: CompletionEvent) -> Result<(), CompletionSinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionSinkError {
    #[error("completion sink unavailable: {0}")]
    Unavailable(String),
}
