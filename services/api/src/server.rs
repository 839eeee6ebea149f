use crate::cli::ServeArgs;
use crate::infra::{language_model, trade_in_service, valuation_engine, AppState};
use crate::routes::with_safetynet_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use safetynet::config::AppConfig;
use safetynet::error::AppError;
use safetynet::telemetry;
use safetynet::workflows::account::{AccountState, AccountStore};
use safetynet::workflows::advisor::Advisor;
use safetynet::workflows::tradein::DeviceScanner;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let model = language_model(&config.model)?;
    let engine = valuation_engine(&config.trade_in)?;
    let account = Arc::new(AccountStore::new(AccountState::demo(Utc::now())));
    let service = Arc::new(trade_in_service(
        model.clone(),
        engine,
        DeviceScanner::new(config.trade_in.scan_tick),
        account.clone(),
    ));

    let app = with_safetynet_routes(service, account, Advisor::new(model))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        offline = config.model.is_offline(),
        "safetynet service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
