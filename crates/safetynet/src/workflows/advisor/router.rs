use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::story::{StoryProgress, StoryScenario};
use super::{Advisor, ChatMessage};
use crate::workflows::account::{AccountEvent, AccountStore};
use crate::workflows::tradein::domain::{DeviceCategory, Pesos};

const DEFAULT_CONTRACT_TYPE: &str = "Personal Cash Loan";

/// Advisor plus the account it personalises answers for.
pub struct AdvisorState {
    pub advisor: Advisor,
    pub account: Arc<AccountStore>,
}

pub fn advisor_router(state: Arc<AdvisorState>) -> Router {
    Router::new()
        .route("/api/v1/mentor/chat", post(chat_handler))
        .route("/api/v1/mentor/risk-tips/:loan_id", get(risk_tip_handler))
        .route("/api/v1/contracts/explain", post(explain_handler))
        .route("/api/v1/contracts/simulate", post(simulate_handler))
        .route("/api/v1/story", get(story_start_handler))
        .route("/api/v1/story/turns", post(story_turn_handler))
        .route("/api/v1/promolens", post(promolens_handler))
        .route(
            "/api/v1/tradein/upgrade-prediction",
            post(upgrade_prediction_handler),
        )
        .route("/api/v1/tradein/condition-scan", post(condition_scan_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    history: Vec<ChatMessage>,
}

pub(crate) async fn chat_handler(
    State(state): State<Arc<AdvisorState>>,
    axum::Json(request): axum::Json<ChatRequest>,
) -> Response {
    let context = state.account.snapshot().user.mentor_context();
    let reply = state
        .advisor
        .financial_advice(&request.history, &context)
        .await;
    (StatusCode::OK, axum::Json(json!({ "reply": reply }))).into_response()
}

pub(crate) async fn risk_tip_handler(
    State(state): State<Arc<AdvisorState>>,
    Path(loan_id): Path<String>,
) -> Response {
    let summary = match state.account.snapshot().loan(&loan_id) {
        Some(loan) => loan.risk_summary(),
        None => {
            let payload = json!({ "error": format!("loan `{loan_id}` not found") });
            return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
        }
    };
    let tip = state.advisor.risk_tip(&summary).await;
    (
        StatusCode::OK,
        axum::Json(json!({ "loan_id": loan_id, "tip": tip })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClauseRequest {
    clause: String,
}

pub(crate) async fn explain_handler(
    State(state): State<Arc<AdvisorState>>,
    axum::Json(request): axum::Json<ClauseRequest>,
) -> Response {
    if request.clause.trim().is_empty() {
        let payload = json!({ "error": "select a clause to explain" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }
    let explanation = state.advisor.explain_clause(request.clause.trim()).await;
    (
        StatusCode::OK,
        axum::Json(json!({ "explanation": explanation })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScenarioRequest {
    scenario: String,
    #[serde(default)]
    contract_type: Option<String>,
}

pub(crate) async fn simulate_handler(
    State(state): State<Arc<AdvisorState>>,
    axum::Json(request): axum::Json<ScenarioRequest>,
) -> Response {
    let contract_type = request
        .contract_type
        .as_deref()
        .unwrap_or(DEFAULT_CONTRACT_TYPE);
    let outcome = state
        .advisor
        .simulate_scenario(&request.scenario, contract_type)
        .await;
    (StatusCode::OK, axum::Json(json!({ "outcome": outcome }))).into_response()
}

pub(crate) async fn story_start_handler() -> Response {
    let payload = json!({
        "scenario": StoryScenario::opening(),
        "progress": StoryProgress::default(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoryTurnRequest {
    #[serde(default)]
    progress: Option<StoryProgress>,
    choice: String,
}

pub(crate) async fn story_turn_handler(
    State(state): State<Arc<AdvisorState>>,
    axum::Json(request): axum::Json<StoryTurnRequest>,
) -> Response {
    let progress = request.progress.unwrap_or_default();

    if progress.is_final_turn() {
        let (_, notification) = state.account.apply(AccountEvent::StoryChapterCompleted);
        let payload = json!({
            "completed": true,
            "notification": notification,
        });
        return (StatusCode::OK, axum::Json(payload)).into_response();
    }

    let raw = state
        .advisor
        .next_story_segment(&progress.context, &request.choice)
        .await;
    let scenario = StoryScenario::parse(&raw);
    let next = progress.advance(&request.choice, &scenario);
    let payload = json!({
        "completed": false,
        "scenario": scenario,
        "progress": next,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriceTagRequest {
    item: String,
    price: Pesos,
}

pub(crate) async fn promolens_handler(
    State(state): State<Arc<AdvisorState>>,
    axum::Json(request): axum::Json<PriceTagRequest>,
) -> Response {
    if request.item.trim().is_empty() || request.price == 0 {
        let payload = json!({ "error": "item and a non-zero price are required" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }
    let level = state.account.snapshot().user.level;
    let quote = state
        .advisor
        .analyze_price_tag(request.item.trim(), request.price, level)
        .await;
    (StatusCode::OK, axum::Json(quote)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpgradeRequest {
    device: String,
}

pub(crate) async fn upgrade_prediction_handler(
    State(state): State<Arc<AdvisorState>>,
    axum::Json(request): axum::Json<UpgradeRequest>,
) -> Response {
    let level = state.account.snapshot().user.level;
    let prediction = state
        .advisor
        .upgrade_prediction(level, &request.device)
        .await;
    (StatusCode::OK, axum::Json(prediction)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConditionScanRequest {
    #[serde(default)]
    category: DeviceCategory,
}

pub(crate) async fn condition_scan_handler(
    State(state): State<Arc<AdvisorState>>,
    axum::Json(request): axum::Json<ConditionScanRequest>,
) -> Response {
    let inspection = state.advisor.scan_device_condition(request.category);
    (StatusCode::OK, axum::Json(inspection)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OfflineModel;
    use crate::workflows::account::AccountState;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;

    fn state() -> Arc<AdvisorState> {
        Arc::new(AdvisorState {
            advisor: Advisor::new(Arc::new(OfflineModel)),
            account: Arc::new(AccountStore::new(AccountState::demo(Utc::now()))),
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn read_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn promolens_uses_account_level_in_fallback_pitch() {
        let response = advisor_router(state())
            .oneshot(post_json(
                "/api/v1/promolens",
                json!({ "item": "Air fryer", "price": 6000 }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["installment12mo"], 525);
        assert!(payload["salesPitch"]
            .as_str()
            .unwrap_or_default()
            .contains("Silver Tier"));
    }

    #[tokio::test]
    async fn risk_tip_for_unknown_loan_is_not_found() {
        let response = advisor_router(state())
            .oneshot(
                Request::get("/api/v1/mentor/risk-tips/L-404")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn final_story_turn_rewards_the_account() {
        let state = state();
        let progress = StoryProgress {
            context: "ctx".to_string(),
            turn: 3,
        };
        let response = advisor_router(state.clone())
            .oneshot(post_json(
                "/api/v1/story/turns",
                json!({ "progress": progress, "choice": "Save the cash" }),
            ))
            .await
            .expect("route executes");

        let payload = read_json(response).await;
        assert_eq!(payload["completed"], true);
        assert_eq!(
            payload["notification"]["message"],
            "Story Chapter Complete! +100 XP"
        );
        assert_eq!(state.account.snapshot().user.points, 450);
    }

    #[tokio::test]
    async fn early_story_turn_advances_progress() {
        let response = advisor_router(state())
            .oneshot(post_json(
                "/api/v1/story/turns",
                json!({ "choice": "Buy the stock" }),
            ))
            .await
            .expect("route executes");

        let payload = read_json(response).await;
        assert_eq!(payload["completed"], false);
        assert_eq!(payload["progress"]["turn"], 2);
        assert_eq!(payload["scenario"]["options"][0]["nextContext"], "Continue carefully.");
    }

    #[tokio::test]
    async fn blank_clause_is_rejected() {
        let response = advisor_router(state())
            .oneshot(post_json(
                "/api/v1/contracts/explain",
                json!({ "clause": "  " }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
