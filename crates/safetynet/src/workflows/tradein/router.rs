use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::DeviceAssessmentRequest;
use super::repository::{CompletionSink, SessionId, SessionRepository, SessionRepositoryError};
use super::service::{TradeInService, TradeInServiceError};
use super::wizard::{UserAction, WizardError};
use crate::workflows::account::AccountStore;

/// Service plus the account whose trust score and loan history gate each session.
pub struct TradeInApi<R, S> {
    pub service: Arc<TradeInService<R, S>>,
    pub account: Arc<AccountStore>,
}

/// Router builder exposing the trade-in wizard and one-shot valuation.
pub fn tradein_router<R, S>(
    service: Arc<TradeInService<R, S>>,
    account: Arc<AccountStore>,
) -> Router
where
    R: SessionRepository + 'static,
    S: CompletionSink + 'static,
{
    let state = Arc::new(TradeInApi { service, account });
    Router::new()
        .route("/api/v1/tradein/sessions", post(open_handler::<R, S>))
        .route(
            "/api/v1/tradein/sessions/:session_id",
            get(session_handler::<R, S>),
        )
        .route(
            "/api/v1/tradein/sessions/:session_id/events",
            post(event_handler::<R, S>),
        )
        .route("/api/v1/tradein/assess", post(assess_handler::<R, S>))
        .with_state(state)
}

pub(crate) async fn open_handler<R, S>(State(api): State<Arc<TradeInApi<R, S>>>) -> Response
where
    R: SessionRepository + 'static,
    S: CompletionSink + 'static,
{
    let (context, has_completed_loan) = api.account.wizard_context();
    match api.service.open(context, has_completed_loan) {
        Ok(session) => (StatusCode::CREATED, axum::Json(session.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn session_handler<R, S>(
    State(api): State<Arc<TradeInApi<R, S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: CompletionSink + 'static,
{
    match api.service.get(&SessionId(session_id)) {
        Ok(session) => (StatusCode::OK, axum::Json(session.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn event_handler<R, S>(
    State(api): State<Arc<TradeInApi<R, S>>>,
    Path(session_id): Path<String>,
    axum::Json(action): axum::Json<UserAction>,
) -> Response
where
    R: SessionRepository + 'static,
    S: CompletionSink + 'static,
{
    match api.service.apply(&SessionId(session_id), action).await {
        Ok(session) => (StatusCode::OK, axum::Json(session.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assess_handler<R, S>(
    State(api): State<Arc<TradeInApi<R, S>>>,
    axum::Json(request): axum::Json<DeviceAssessmentRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    S: CompletionSink + 'static,
{
    // Clamp on the way in; deserialization bypasses the constructor.
    let request = DeviceAssessmentRequest::new(
        request.device_category,
        request.model_name,
        request.condition,
        request.trust_score,
        request.contract_id,
    );
    if request.model_name.trim().is_empty() {
        let payload = json!({ "error": "model name is required" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }
    let assessment = api.service.assess(&request).await;
    (StatusCode::OK, axum::Json(assessment)).into_response()
}

fn error_response(error: TradeInServiceError) -> Response {
    match error {
        TradeInServiceError::Locked => {
            let payload = json!({
                "error": error.to_string(),
                "locked": true,
            });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        TradeInServiceError::Repository(SessionRepositoryError::NotFound) => {
            let payload = json!({ "error": "trade-in session not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        TradeInServiceError::Wizard(WizardError::IncompleteForm { missing }) => {
            let payload = json!({
                "error": "form is incomplete",
                "missing_fields": missing,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        TradeInServiceError::Wizard(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
