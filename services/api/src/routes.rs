use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use safetynet::workflows::account::{account_router, AccountStore};
use safetynet::workflows::advisor::{advisor_router, Advisor, AdvisorState};
use safetynet::workflows::tradein::{
    tradein_router, CompletionSink, SessionRepository, TradeInService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_safetynet_routes<R, S>(
    service: Arc<TradeInService<R, S>>,
    account: Arc<AccountStore>,
    advisor: Advisor,
) -> axum::Router
where
    R: SessionRepository + 'static,
    S: CompletionSink + 'static,
{
    let advisor_state = Arc::new(AdvisorState {
        advisor,
        account: account.clone(),
    });

    tradein_router(service, account.clone())
        .merge(account_router(account))
        .merge(advisor_router(advisor_state))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
