use metrics_exporter_prometheus::PrometheusHandle;
use safetynet::config::{ModelConfig, TradeInConfig};
use safetynet::error::AppError;
use safetynet::llm::{GeminiClient, LanguageModel, OfflineModel};
use safetynet::workflows::account::AccountStore;
use safetynet::workflows::advisor::Advisor;
use safetynet::workflows::tradein::{
    DeviceCategory, DeviceCondition, DeviceScanner, PriceTable, SessionId, SessionRepository,
    SessionRepositoryError, TradeInAssessor, TradeInService, TradeInSession, ValuationEngine,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, TradeInSession>>>,
}

impl SessionRepository for InMemorySessionRepository {
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
        if guard.contains_key(&session.id) {
            guard.insert(session.id.clone(), session);
            Ok(())
        } else {
            Err(SessionRepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<TradeInSession>, SessionRepositoryError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(crate) type SafetyNetService = TradeInService<InMemorySessionRepository, AccountStore>;

/// Hosted Gemini when a key is configured, otherwise the offline model that forces fallbacks.
pub(crate) fn language_model(config: &ModelConfig) -> Result<Arc<dyn LanguageModel>, AppError> {
    match GeminiClient::from_config(config)? {
        Some(client) => {
            info!(model = %config.model, "using hosted language model");
            Ok(Arc::new(client))
        }
        None => {
            warn!("no model API key configured; every remote call will use its fallback");
            Ok(Arc::new(OfflineModel))
        }
    }
}

pub(crate) fn valuation_engine(config: &TradeInConfig) -> Result<ValuationEngine, AppError> {
    let prices = match &config.price_table_csv {
        Some(path) => {
            let table = PriceTable::from_path(path)?;
            info!(path = %path.display(), entries = table.entries().len(), "loaded price table");
            table
        }
        None => PriceTable::standard(),
    };
    Ok(ValuationEngine::new(prices))
}

pub(crate) fn trade_in_service(
    model: Arc<dyn LanguageModel>,
    engine: ValuationEngine,
    scanner: DeviceScanner,
    account: Arc<AccountStore>,
) -> SafetyNetService {
    TradeInService::new(
        Arc::new(InMemorySessionRepository::default()),
        account,
        Arc::new(TradeInAssessor::new(engine, model.clone())),
        Arc::new(Advisor::new(model)),
        Arc::new(scanner),
    )
}

pub(crate) fn parse_category(raw: &str) -> Result<DeviceCategory, String> {
    DeviceCategory::ordered()
        .into_iter()
        .find(|category| category.label().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| format!("unknown device category '{raw}' (Smartphone, Tablet, Laptop)"))
}

pub(crate) fn parse_condition(raw: &str) -> Result<DeviceCondition, String> {
    [
        DeviceCondition::Excellent,
        DeviceCondition::Good,
        DeviceCondition::Fair,
    ]
    .into_iter()
    .find(|condition| condition.label().eq_ignore_ascii_case(raw.trim()))
    .ok_or_else(|| format!("unknown device condition '{raw}' (Excellent, Good, Fair)"))
}
