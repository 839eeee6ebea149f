use crate::infra::{
    language_model, parse_category, parse_condition, trade_in_service, valuation_engine,
};
use chrono::Utc;
use clap::Args;
use safetynet::config::AppConfig;
use safetynet::error::AppError;
use safetynet::llm::{LanguageModel, OfflineModel};
use safetynet::workflows::account::{AccountState, AccountStore};
use safetynet::workflows::tradein::{
    Assessment, DeviceAssessmentRequest, DeviceCategory, DeviceCondition, DeviceScanner,
    ScanMode, TradeInAssessor, TradeInSession, UserAction,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Device category (Smartphone, Tablet, Laptop)
    #[arg(long, value_parser = parse_category, default_value = "Smartphone")]
    pub(crate) category: DeviceCategory,
    /// Model name as the customer would type it, e.g. "Samsung Galaxy A54"
    #[arg(long)]
    pub(crate) model: String,
    /// Physical condition (Excellent, Good, Fair)
    #[arg(long, value_parser = parse_condition, default_value = "Good")]
    pub(crate) condition: DeviceCondition,
    /// Customer trust score; values above 1000 are clamped
    #[arg(long, default_value_t = 650)]
    pub(crate) trust_score: u16,
    /// Verified financing contract id; omit to value without trade-in readiness
    #[arg(long)]
    pub(crate) contract_id: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Call the configured language model instead of forcing fallbacks
    #[arg(long)]
    pub(crate) live: bool,
    /// Seed for the simulated device scanner
    #[arg(long, default_value_t = 7)]
    pub(crate) seed: u64,
    /// Contract id entered on the trade-in form
    #[arg(long, default_value = "230012999")]
    pub(crate) contract_id: String,
}

pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        category,
        model,
        condition,
        trust_score,
        contract_id,
    } = args;

    let config = AppConfig::load()?;
    let assessor = TradeInAssessor::new(
        valuation_engine(&config.trade_in)?,
        language_model(&config.model)?,
    );
    let request = DeviceAssessmentRequest::new(
        category,
        model,
        condition,
        trust_score,
        contract_id.filter(|id| !id.trim().is_empty()),
    );

    let assessment = assessor.assess(&request).await;
    render_assessment(&request, &assessment);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        live,
        seed,
        contract_id,
    } = args;

    let config = AppConfig::load()?;
    let model: Arc<dyn LanguageModel> = if live {
        language_model(&config.model)?
    } else {
        Arc::new(OfflineModel)
    };

    let account = Arc::new(AccountStore::new(AccountState::demo(Utc::now())));
    let service = trade_in_service(
        model,
        valuation_engine(&config.trade_in)?,
        DeviceScanner::seeded(Duration::ZERO, seed),
        account.clone(),
    );

    let view = account.view();
    println!("SafetyNet Smart Scan demo");
    println!(
        "- {} | trust score {} | {} member",
        view.state.user.name,
        view.state.user.reputation_score,
        view.state.user.level.label()
    );

    let (context, unlocked) = account.wizard_context();
    let session = match service.open(context, unlocked) {
        Ok(session) => session,
        Err(err) => {
            println!("  Trade-in unavailable: {}", err);
            return Ok(());
        }
    };
    println!("- Opened session {}", session.id);

    let actions = vec![
        UserAction::SelectScanMode {
            mode: ScanMode::SelfScan,
        },
        UserAction::StartDeviceScan,
        UserAction::SetContractId { contract_id },
        UserAction::AttachReceipt {
            file_name: "official-receipt.jpg".to_string(),
        },
        UserAction::RequestAssessment,
        UserAction::ConfirmAssessment,
    ];

    let mut latest = session;
    for action in actions {
        let name = action.name();
        latest = match service.apply(&latest.id, action).await {
            Ok(session) => session,
            Err(err) => {
                println!("  {} rejected: {}", name, err);
                return Ok(());
            }
        };
        println!("  {} -> {}", name, latest.step().label());
    }

    let form = latest.state.form();
    println!(
        "- Detected {} (serial {}, condition {})",
        form.model,
        form.serial_number,
        form.condition.map(|c| c.label()).unwrap_or("pending")
    );

    if let Some(results) = latest.state.results() {
        let request = DeviceAssessmentRequest::new(
            form.category.unwrap_or_default(),
            form.model.clone(),
            form.condition.unwrap_or_default(),
            latest.context.trust_score,
            Some(form.contract_id.clone()),
        );
        render_assessment(
            &request,
            &Assessment {
                source: results.source,
                result: results.result.clone(),
            },
        );
        if let Some(prediction) = &results.prediction {
            println!(
                "  Upgrade outlook: {} ({:?} urgency, projected drop {})",
                prediction.reason, prediction.urgency, prediction.projected_drop
            );
        }

        let follow_up = if results.result.trade_in_value > 0 {
            vec![
                UserAction::OpenPhysicalTradeIn,
                UserAction::ConfirmPhysicalTradeIn,
            ]
        } else {
            results
                .result
                .perks
                .first()
                .map(|perk| UserAction::ClaimPerk {
                    perk_id: perk.id.clone(),
                })
                .into_iter()
                .collect()
        };
        for action in follow_up {
            latest = service.apply(&latest.id, action).await?;
        }
    }

    render_notices(&latest, &account);
    Ok(())
}

fn render_assessment(request: &DeviceAssessmentRequest, assessment: &Assessment) {
    let result = &assessment.result;
    println!("\nValuation for {}", request.display_name());
    println!(
        "- Source: {:?} | score {} | tier {}",
        assessment.source,
        result.device_score,
        result.tier.label()
    );
    println!(
        "- Trade-in value: ₱{} | ready: {}",
        result.trade_in_value, result.is_trade_in_ready
    );
    println!("- Bundle: {}", result.bundle_name);
    for perk in &result.perks {
        println!("    - [{}] {}: {}", perk.id, perk.title, perk.value);
    }
    println!("  {}", result.ai_message);
}

fn render_notices(session: &TradeInSession, account: &AccountStore) {
    if !session.notices.is_empty() {
        println!("\nWizard notices");
        for notice in &session.notices {
            println!("- {}", notice);
        }
    }

    let notifications = account.notifications();
    if !notifications.is_empty() {
        println!("\nAccount updates");
        for notification in notifications {
            println!("- {}", notification.message);
        }
    }
    let view = account.view();
    println!(
        "- Points balance {} | trust score {}",
        view.state.user.points, view.state.user.reputation_score
    );
}
