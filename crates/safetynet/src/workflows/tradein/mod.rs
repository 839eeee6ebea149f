//! Smart Scan trade-in: device valuation, perk bundles, and the three-step wizard.
//!
//! Valuation never fails. The remote assessor asks the language model first and falls back to
//! the deterministic [`ValuationEngine`] whenever the model is unavailable or its answer breaks
//! local eligibility or tiering.

pub mod assessor;
pub mod bundles;
pub mod domain;
pub mod eligibility;
pub mod pricing;
pub mod repository;
pub mod router;
pub mod scanner;
pub mod service;
pub mod valuation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use assessor::{Assessment, TradeInAssessor};
pub use bundles::{select_bundle, Bundle, TrustBand};
pub use domain::{
    AssessmentSource, DeviceAssessmentRequest, DeviceCategory, DeviceCondition, DeviceTier, Perk,
    group_thousands, PerkKind, Pesos, ScanResult, MAX_TRUST_SCORE,
};
pub use eligibility::{compute_trade_in_value, is_trade_in_ready};
pub use pricing::{adjust_for_condition, PriceTable, PriceTableImportError, DEFAULT_BASE_PRICE};
pub use repository::{
    CompletionSink, CompletionSinkError, SessionId, SessionRepository, SessionRepositoryError,
    SessionView, TradeInSession,
};
pub use router::{tradein_router, TradeInApi};
pub use scanner::{DetectedDevice, DeviceScanner, ScanMode};
pub use service::{TradeInService, TradeInServiceError};
pub use valuation::ValuationEngine;
pub use wizard::{
    transition, CompletionEvent, InputForm, RequiredField, Transition, UserAction, WizardContext,
    WizardEffect, WizardError, WizardEvent, WizardState, WizardStep,
};
