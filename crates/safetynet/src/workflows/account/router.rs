use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::reducer::AccountEvent;
use super::store::AccountStore;

pub fn account_router(store: Arc<AccountStore>) -> Router {
    Router::new()
        .route("/api/v1/account", get(account_handler))
        .route("/api/v1/account/events", post(event_handler))
        .route("/api/v1/account/rewards", get(rewards_handler))
        .with_state(store)
}

pub(crate) async fn account_handler(State(store): State<Arc<AccountStore>>) -> Response {
    (StatusCode::OK, axum::Json(store.view())).into_response()
}

pub(crate) async fn event_handler(
    State(store): State<Arc<AccountStore>>,
    axum::Json(event): axum::Json<AccountEvent>,
) -> Response {
    let (state, notification) = store.apply(event);
    let payload = json!({
        "account": state,
        "notification": notification,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn rewards_handler(State(store): State<Arc<AccountStore>>) -> Response {
    (StatusCode::OK, axum::Json(store.rewards())).into_response()
}
