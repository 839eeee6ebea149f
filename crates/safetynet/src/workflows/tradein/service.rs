use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use super::assessor::{Assessment, TradeInAssessor};
use super::domain::DeviceAssessmentRequest;
use super::repository::{
    CompletionSink, CompletionSinkError, SessionId, SessionRepository, SessionRepositoryError,
    TradeInSession,
};
use super::scanner::DeviceScanner;
use super::wizard::{
    transition, UserAction, WizardContext, WizardEffect, WizardError, WizardEvent, WizardState,
};
use crate::workflows::account::LoyaltyLevel;
use crate::workflows::advisor::Advisor;

/// Runs wizard transitions against stored sessions and executes the resulting effects.
pub struct TradeInService<R, S> {
    repository: Arc<R>,
    sink: Arc<S>,
    assessor: Arc<TradeInAssessor>,
    advisor: Arc<Advisor>,
    scanner: Arc<DeviceScanner>,
    assessment_deadline: Duration,
    /// One async lock per session; `apply` holds it across every effect it awaits.
    session_locks: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("ts-{id:06}"))
}

impl<R, S> TradeInService<R, S>
where
    R: SessionRepository + 'static,
    S: CompletionSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        sink: Arc<S>,
        assessor: Arc<TradeInAssessor>,
        advisor: Arc<Advisor>,
        scanner: Arc<DeviceScanner>,
    ) -> Self {
        Self {
            repository,
            sink,
            assessor,
            advisor,
            scanner,
            assessment_deadline: Duration::from_secs(60),
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Upper bound on a valuation round trip before the wizard returns to input.
    pub fn with_assessment_deadline(mut self, deadline: Duration) -> Self {
        self.assessment_deadline = deadline;
        self
    }

    pub fn assessor(&self) -> &TradeInAssessor {
        &self.assessor
    }

    /// Opens a new wizard session. Trade-in stays locked until a loan has been paid off.
    pub fn open(
        &self,
        context: WizardContext,
        has_completed_loan: bool,
    ) -> Result<TradeInSession, TradeInServiceError> {
        if !has_completed_loan {
            return Err(TradeInServiceError::Locked);
        }

        let now = Utc::now();
        let session = TradeInSession {
            id: next_session_id(),
            context,
            state: WizardState::default(),
            notices: Vec::new(),
            completions: Vec::new(),
            opened_at: now,
            updated_at: now,
        };
        let stored = self.repository.insert(session)?;
        info!(
            session = %stored.id,
            trust_score = stored.context.trust_score,
            "trade-in session opened"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &SessionId) -> Result<TradeInSession, TradeInServiceError> {
        let session = self
            .repository
            .fetch(id)?
            .ok_or(SessionRepositoryError::NotFound)?;
        Ok(session)
    }

    /// Applies a user action, then runs every effect it triggers until the wizard settles.
    ///
    /// A rejected action leaves the stored session untouched. Actions on one session run one
    /// at a time.
    pub async fn apply(
        &self,
        id: &SessionId,
        action: UserAction,
    ) -> Result<TradeInSession, TradeInServiceError> {
        let lock = self.session_lock(id);
        let _guard = lock.lock().await;

        let mut session = self.get(id)?;
        let mut effects = VecDeque::new();
        self.step(&mut session, WizardEvent::User(action), &mut effects)?;

        while let Some(effect) = effects.pop_front() {
            let follow_up = match effect {
                WizardEffect::RunDeviceScan { category, mode } => {
                    let detected = self.scanner.scan(category, mode).await;
                    Some(WizardEvent::DeviceScanned(detected))
                }
                WizardEffect::CallValuationEngine { request, level } => {
                    Some(self.value_device(&request, level).await)
                }
                WizardEffect::EmitCompletion(event) => {
                    self.sink.publish(event.clone())?;
                    session.completions.push(event);
                    None
                }
                WizardEffect::Notify(message) => {
                    session.notices.push(message);
                    None
                }
            };

            if let Some(event) = follow_up {
                self.step(&mut session, event, &mut effects)?;
            }
        }

        self.repository.update(session.clone())?;
        Ok(session)
    }

    fn session_lock(&self, id: &SessionId) -> Arc<tokio::sync::Mutex<()>> {
        self.session_locks
            .lock()
            .expect("session lock table poisoned")
            .entry(id.clone())
            .or_default()
            .clone()
    }

    /// One-shot valuation outside any session.
    pub async fn assess(&self, request: &DeviceAssessmentRequest) -> Assessment {
        self.assessor.assess(request).await
    }

    fn step(
        &self,
        session: &mut TradeInSession,
        event: WizardEvent,
        effects: &mut VecDeque<WizardEffect>,
    ) -> Result<(), TradeInServiceError> {
        let outcome = transition(&session.state, &session.context, event)?;
        session.state = outcome.state;
        session.updated_at = Utc::now();
        effects.extend(outcome.effects);
        self.repository.update(session.clone())?;
        Ok(())
    }

    async fn value_device(
        &self,
        request: &DeviceAssessmentRequest,
        level: LoyaltyLevel,
    ) -> WizardEvent {
        let device = request.display_name();
        let work = async {
            tokio::join!(
                self.assessor.assess(request),
                self.advisor.upgrade_prediction(level, &device)
            )
        };

        match tokio::time::timeout(self.assessment_deadline, work).await {
            Ok((assessment, prediction)) => WizardEvent::AssessmentCompleted {
                assessment,
                prediction: Some(prediction),
            },
            Err(_) => {
                warn!(device = %device, "device valuation timed out");
                WizardEvent::AssessmentFailed {
                    reason: "device valuation timed out".to_string(),
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TradeInServiceError {
    #[error("trade-in unlocks after your first fully paid loan")]
    Locked,
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Repository(#[from] SessionRepositoryError),
    #[error(transparent)]
    Completion(#[from] CompletionSinkError),
}
