use super::common::*;
use crate::llm::OfflineModel;
use crate::workflows::advisor::Advisor;
use crate::workflows::tradein::repository::{SessionId, SessionRepository, SessionRepositoryError};
use crate::workflows::tradein::{
    AssessmentSource, CompletionEvent, DeviceCategory, DeviceCondition, DeviceScanner, DeviceTier,
    TradeInAssessor, TradeInService, TradeInServiceError, UserAction, ValuationEngine, WizardError,
    WizardState, WizardStep,
};
use std::sync::Arc;
use std::time::Duration;

async fn run(
    service: &TradeInService<MemorySessions, MemorySink>,
    id: &SessionId,
    actions: Vec<UserAction>,
) {
    for action in actions {
        let name = action.name();
        service
            .apply(id, action)
            .await
            .unwrap_or_else(|err| panic!("{name} failed: {err}"));
    }
}

#[test]
fn open_requires_a_paid_loan() {
    let (service, _, _) = build_service(Arc::new(OfflineModel));
    match service.open(context(720), false) {
        Err(TradeInServiceError::Locked) => {}
        other => panic!("expected locked error, got {other:?}"),
    }
}

#[test]
fn open_propagates_repository_failures() {
    let model = Arc::new(OfflineModel);
    let service = TradeInService::new(
        Arc::new(UnavailableSessions),
        Arc::new(MemorySink::default()),
        Arc::new(TradeInAssessor::new(ValuationEngine::default(), model.clone())),
        Arc::new(Advisor::new(model)),
        Arc::new(DeviceScanner::seeded(Duration::ZERO, 1)),
    );

    match service.open(context(720), true) {
        Err(TradeInServiceError::Repository(SessionRepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable error, got {other:?}"),
    }
}

#[test]
fn get_propagates_not_found() {
    let (service, _, _) = build_service(Arc::new(OfflineModel));
    match service.get(&SessionId("missing".to_string())) {
        Err(TradeInServiceError::Repository(SessionRepositoryError::NotFound)) => {}
        other => panic!("expected not found error, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_actions_leave_the_session_untouched() {
    let (service, repository, _) = build_service(Arc::new(OfflineModel));
    let session = service.open(context(650), true).expect("session opens");
    let before = repository
        .fetch(&session.id)
        .expect("fetch succeeds")
        .expect("session stored");

    match service
        .apply(&session.id, UserAction::RequestAssessment)
        .await
    {
        Err(TradeInServiceError::Wizard(WizardError::IncompleteForm { missing })) => {
            assert!(!missing.is_empty());
        }
        other => panic!("expected incomplete form, got {other:?}"),
    }

    let after = repository
        .fetch(&session.id)
        .expect("fetch succeeds")
        .expect("session stored");
    assert_eq!(after, before);
}

#[tokio::test]
async fn remote_failure_still_reaches_results() {
    let model = ScriptedModel::failing("connection reset");
    let (service, _, _) = build_service(model.clone());
    let session = service.open(context(650), true).expect("session opens");

    let mut actions = complete_form("Samsung Galaxy A54", "C-100");
    actions.push(UserAction::RequestAssessment);
    run(&service, &session.id, actions).await;

    let settled = service
        .apply(&session.id, UserAction::ConfirmAssessment)
        .await
        .expect("assessment runs");

    let results = settled.state.results().expect("results step");
    assert_eq!(results.source, AssessmentSource::Fallback);
    assert_eq!(results.result.trade_in_value, 11_200);
    assert!(results.result.is_trade_in_ready);
    assert!(results.prediction.is_some());
    // Assessment and upgrade prediction both asked the model.
    assert_eq!(model.calls().len(), 2);
}

#[tokio::test]
async fn consistent_remote_answer_is_used() {
    let model = ScriptedModel::replying(remote_scan_json(78, "Bonus", true, 12_000));
    let (service, _, _) = build_service(model);
    let session = service.open(context(650), true).expect("session opens");

    let mut actions = complete_form("Samsung Galaxy A54", "C-100");
    actions.push(UserAction::RequestAssessment);
    actions.push(UserAction::ConfirmAssessment);
    run(&service, &session.id, actions).await;

    let stored = service.get(&session.id).expect("session stored");
    let results = stored.state.results().expect("results step");
    assert_eq!(results.source, AssessmentSource::Remote);
    assert_eq!(results.result.bundle_name, "Loyalty Booster Pack");
    assert_eq!(results.result.trade_in_value, 12_000);
}

#[tokio::test]
async fn remote_answer_contradicting_eligibility_falls_back() {
    // Claims readiness and cash value for a laptop.
    let model = ScriptedModel::replying(remote_scan_json(92, "Premium", true, 30_000));
    let (service, _, _) = build_service(model);
    let session = service.open(context(720), true).expect("session opens");

    let mut actions = complete_form("MacBook Air M2", "C1");
    actions[0] = UserAction::SelectCategory {
        category: DeviceCategory::Laptop,
    };
    actions.push(UserAction::SetCondition {
        condition: DeviceCondition::Excellent,
    });
    actions.push(UserAction::RequestAssessment);
    actions.push(UserAction::ConfirmAssessment);
    run(&service, &session.id, actions).await;

    let stored = service.get(&session.id).expect("session stored");
    let results = stored.state.results().expect("results step");
    assert_eq!(results.source, AssessmentSource::Fallback);
    assert_eq!(results.result.tier, DeviceTier::Premium);
    assert_eq!(results.result.trade_in_value, 0);
}

#[tokio::test]
async fn stalled_valuation_returns_to_input() {
    let (service, _, _) = build_service(Arc::new(StalledModel));
    let service = service.with_assessment_deadline(Duration::from_millis(20));
    let session = service.open(context(650), true).expect("session opens");

    let mut actions = complete_form("Google Pixel 8", "C-77");
    actions.push(UserAction::RequestAssessment);
    run(&service, &session.id, actions).await;

    let settled = service
        .apply(&session.id, UserAction::ConfirmAssessment)
        .await
        .expect("timeout handled");
    assert_eq!(settled.step(), WizardStep::Input);
    assert_eq!(settled.state.form().model, "Google Pixel 8");
}

#[tokio::test]
async fn device_scan_fills_model_and_serial() {
    let (service, _, _) = build_service(Arc::new(OfflineModel));
    let session = service.open(context(650), true).expect("session opens");

    let scanned = service
        .apply(&session.id, UserAction::StartDeviceScan)
        .await
        .expect("scan completes");

    let WizardState::Input(input) = &scanned.state else {
        panic!("scan stays on input");
    };
    assert!(!input.device_scan_running);
    assert!(!input.form.model.is_empty());
    assert!(input.form.serial_from_system);
    assert_eq!(
        scanned.notices,
        vec!["System diagnostics complete. Hardware identifiers verified.".to_string()]
    );
}

#[tokio::test]
async fn completions_reach_the_sink() {
    let (service, _, sink) = build_service(Arc::new(OfflineModel));
    let session = service.open(context(650), true).expect("session opens");

    let mut actions = complete_form("Samsung Galaxy A54", "C-100");
    actions.extend([
        UserAction::RequestAssessment,
        UserAction::ConfirmAssessment,
        UserAction::ClaimPerk {
            perk_id: "1".to_string(),
        },
        UserAction::OpenPhysicalTradeIn,
        UserAction::ConfirmPhysicalTradeIn,
    ]);
    run(&service, &session.id, actions).await;

    assert_eq!(
        sink.events(),
        vec![
            CompletionEvent::PerkActivated {
                perk_id: "1".to_string()
            },
            CompletionEvent::CashVoucher { value: 11_200 },
        ]
    );
    let stored = service.get(&session.id).expect("session stored");
    assert_eq!(stored.completions, sink.events());
    assert_eq!(stored.notices.len(), 2);
}

#[tokio::test]
async fn concurrent_actions_on_one_session_keep_both_updates() {
    let model = Arc::new(OfflineModel);
    let service = TradeInService::new(
        Arc::new(MemorySessions::default()),
        Arc::new(MemorySink::default()),
        Arc::new(TradeInAssessor::new(ValuationEngine::default(), model.clone())),
        Arc::new(Advisor::new(model)),
        Arc::new(DeviceScanner::seeded(Duration::from_millis(2), 11)),
    );
    let session = service.open(context(650), true).expect("session opens");

    let (scanned, edited) = tokio::join!(
        service.apply(&session.id, UserAction::StartDeviceScan),
        service.apply(
            &session.id,
            UserAction::SetContractId {
                contract_id: "C-NEW".to_string(),
            }
        ),
    );
    scanned.expect("device scan applied");
    edited.expect("contract id applied");

    let stored = service.get(&session.id).expect("session stored");
    let WizardState::Input(input) = &stored.state else {
        panic!("expected input, got {:?}", stored.step());
    };
    assert_eq!(input.form.contract_id, "C-NEW");
    assert!(!input.device_scan_running);
    assert!(!input.form.model.is_empty());
}
