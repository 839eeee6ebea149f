//! Trade-in wizard state machine.
//!
//! `Input → Scanning → Results`, with `Scanning → Input` when the assessment cannot be run and
//! `Results → Input` on reset. [`transition`] is pure: it never performs I/O and instead returns
//! [`WizardEffect`] intents that the session service executes and feeds back as events.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::assessor::Assessment;
use super::domain::{
    AssessmentSource, DeviceAssessmentRequest, DeviceCategory, DeviceCondition, Pesos, ScanResult,
};
use super::scanner::{DetectedDevice, ScanMode};
use crate::workflows::account::LoyaltyLevel;
use crate::workflows::advisor::UpgradePrediction;

/// Caller facts captured once when the session opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardContext {
    pub trust_score: u16,
    pub level: LoyaltyLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Category,
    Model,
    Condition,
    ContractId,
    Receipt,
    SerialNumber,
}

/// Fields collected on the input step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputForm {
    pub category: Option<DeviceCategory>,
    pub scan_mode: ScanMode,
    pub model: String,
    pub condition: Option<DeviceCondition>,
    pub serial_number: String,
    /// Set when a self-scan read the serial; the field is then read-only.
    pub serial_from_system: bool,
    pub contract_id: String,
    pub receipt: Option<String>,
}

impl Default for InputForm {
    fn default() -> Self {
        Self {
            category: Some(DeviceCategory::Smartphone),
            scan_mode: ScanMode::SelfScan,
            model: String::new(),
            condition: Some(DeviceCondition::Good),
            serial_number: String::new(),
            serial_from_system: false,
            contract_id: String::new(),
            receipt: None,
        }
    }
}

impl InputForm {
    pub fn missing_fields(&self) -> Vec<RequiredField> {
        let mut missing = Vec::new();
        if self.category.is_none() {
            missing.push(RequiredField::Category);
        }
        if self.model.trim().is_empty() {
            missing.push(RequiredField::Model);
        }
        if self.condition.is_none() {
            missing.push(RequiredField::Condition);
        }
        if self.contract_id.trim().is_empty() {
            missing.push(RequiredField::ContractId);
        }
        if self.receipt.is_none() {
            missing.push(RequiredField::Receipt);
        }
        if self.serial_number.trim().is_empty() {
            missing.push(RequiredField::SerialNumber);
        }
        missing
    }

    pub fn can_submit(&self) -> bool {
        self.missing_fields().is_empty()
    }

    fn clear_device(&mut self) {
        self.model.clear();
        self.serial_number.clear();
        self.serial_from_system = false;
    }

    /// "Scan another": device and verification data go, category and mode stay.
    fn cleared_for_next_scan(&self) -> Self {
        Self {
            category: self.category,
            scan_mode: self.scan_mode,
            condition: self.condition,
            ..Self::default()
        }
    }

    fn assessment_request(&self, context: &WizardContext) -> Result<DeviceAssessmentRequest, WizardError> {
        let missing = self.missing_fields();
        match (self.category, self.condition) {
            (Some(category), Some(condition)) if missing.is_empty() => {
                Ok(DeviceAssessmentRequest::new(
                    category,
                    self.model.trim(),
                    condition,
                    context.trust_score,
                    Some(self.contract_id.trim().to_string()),
                ))
            }
            _ => Err(WizardError::IncompleteForm { missing }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStep {
    pub form: InputForm,
    pub device_scan_running: bool,
    pub consent_gate_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanningStep {
    pub form: InputForm,
    pub request: DeviceAssessmentRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsStep {
    pub form: InputForm,
    pub source: AssessmentSource,
    pub result: ScanResult,
    pub prediction: Option<UpgradePrediction>,
    pub claimed_perks: BTreeSet<String>,
    pub trade_in_gate_open: bool,
    pub voucher_issued: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Input,
    Scanning,
    Results,
}

impl WizardStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Scanning => "scanning",
            Self::Results => "results",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WizardState {
    Input(InputStep),
    Scanning(ScanningStep),
    Results(ResultsStep),
}

impl Default for WizardState {
    fn default() -> Self {
        Self::Input(InputStep {
            form: InputForm::default(),
            device_scan_running: false,
            consent_gate_open: false,
        })
    }
}

impl WizardState {
    pub fn step(&self) -> WizardStep {
        match self {
            Self::Input(_) => WizardStep::Input,
            Self::Scanning(_) => WizardStep::Scanning,
            Self::Results(_) => WizardStep::Results,
        }
    }

    pub fn form(&self) -> &InputForm {
        match self {
            Self::Input(step) => &step.form,
            Self::Scanning(step) => &step.form,
            Self::Results(step) => &step.form,
        }
    }

    pub fn results(&self) -> Option<&ResultsStep> {
        match self {
            Self::Results(step) => Some(step),
            _ => None,
        }
    }
}

/// Actions a user can take from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserAction {
    SelectCategory { category: DeviceCategory },
    SelectScanMode { mode: ScanMode },
    StartDeviceScan,
    SetModel { model: String },
    SetCondition { condition: DeviceCondition },
    SetSerialNumber { serial_number: String },
    SetContractId { contract_id: String },
    AttachReceipt { file_name: String },
    RequestAssessment,
    CancelAssessment,
    ConfirmAssessment,
    ClaimPerk { perk_id: String },
    OpenPhysicalTradeIn,
    CancelPhysicalTradeIn,
    ConfirmPhysicalTradeIn,
    Reset,
}

impl UserAction {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectCategory { .. } => "select_category",
            Self::SelectScanMode { .. } => "select_scan_mode",
            Self::StartDeviceScan => "start_device_scan",
            Self::SetModel { .. } => "set_model",
            Self::SetCondition { .. } => "set_condition",
            Self::SetSerialNumber { .. } => "set_serial_number",
            Self::SetContractId { .. } => "set_contract_id",
            Self::AttachReceipt { .. } => "attach_receipt",
            Self::RequestAssessment => "request_assessment",
            Self::CancelAssessment => "cancel_assessment",
            Self::ConfirmAssessment => "confirm_assessment",
            Self::ClaimPerk { .. } => "claim_perk",
            Self::OpenPhysicalTradeIn => "open_physical_trade_in",
            Self::CancelPhysicalTradeIn => "cancel_physical_trade_in",
            Self::ConfirmPhysicalTradeIn => "confirm_physical_trade_in",
            Self::Reset => "reset",
        }
    }
}

/// Everything the state machine reacts to: user actions plus effect completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    User(UserAction),
    DeviceScanned(DetectedDevice),
    AssessmentCompleted {
        assessment: Assessment,
        prediction: Option<UpgradePrediction>,
    },
    AssessmentFailed {
        reason: String,
    },
}

impl WizardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::User(action) => action.name(),
            Self::DeviceScanned(_) => "device_scanned",
            Self::AssessmentCompleted { .. } => "assessment_completed",
            Self::AssessmentFailed { .. } => "assessment_failed",
        }
    }
}

impl From<UserAction> for WizardEvent {
    fn from(action: UserAction) -> Self {
        Self::User(action)
    }
}

/// Reward hand-off raised out of the results step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionEvent {
    PerkActivated { perk_id: String },
    CashVoucher { value: Pesos },
}

impl CompletionEvent {
    pub fn value(&self) -> Pesos {
        match self {
            Self::PerkActivated { .. } => 0,
            Self::CashVoucher { value } => *value,
        }
    }
}

/// Side-effect intents returned by [`transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum WizardEffect {
    RunDeviceScan {
        category: DeviceCategory,
        mode: ScanMode,
    },
    CallValuationEngine {
        request: DeviceAssessmentRequest,
        level: LoyaltyLevel,
    },
    EmitCompletion(CompletionEvent),
    Notify(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: WizardState,
    pub effects: Vec<WizardEffect>,
}

impl Transition {
    fn to(state: WizardState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with_effect(mut self, effect: WizardEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    AssessmentConsent,
    PhysicalTradeIn,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("form is incomplete, missing: {missing:?}")]
    IncompleteForm { missing: Vec<RequiredField> },
    #[error("select a device category first")]
    CategoryRequired,
    #[error("condition is fixed by the visual scan")]
    ConditionLocked,
    #[error("serial number was read by the device scan and cannot be edited")]
    SerialLocked,
    #[error("a device scan is already running")]
    ScanInProgress,
    #[error("no device scan is running")]
    NoScanRunning,
    #[error("the {0:?} confirmation is not open")]
    GateNotOpen(Gate),
    #[error("perk `{0}` is not part of this result")]
    UnknownPerk(String),
    #[error("perk `{0}` was already claimed")]
    PerkAlreadyClaimed(String),
    #[error("a trade-in voucher was already issued for this scan")]
    VoucherAlreadyIssued,
    #[error("`{event}` is not allowed during the {step} step")]
    InvalidEvent {
        step: &'static str,
        event: &'static str,
    },
}

pub const PERK_ACTIVATED_NOTICE: &str = "Deal Activated! Check your Dashboard.";

/// Computes the next state. On error the caller keeps the previous state.
pub fn transition(
    state: &WizardState,
    context: &WizardContext,
    event: WizardEvent,
) -> Result<Transition, WizardError> {
    let step = state.step();
    debug!(step = step.label(), event = event.name(), "wizard transition");

    match state {
        WizardState::Input(input) => on_input(input.clone(), context, event),
        WizardState::Scanning(scanning) => on_scanning(scanning.clone(), event),
        WizardState::Results(results) => on_results(results.clone(), event),
    }
}

fn invalid(step: WizardStep, event: &WizardEvent) -> WizardError {
    WizardError::InvalidEvent {
        step: step.label(),
        event: event.name(),
    }
}

fn on_input(
    mut input: InputStep,
    context: &WizardContext,
    event: WizardEvent,
) -> Result<Transition, WizardError> {
    let action = match event {
        WizardEvent::DeviceScanned(device) => {
            if !input.device_scan_running {
                return Err(WizardError::NoScanRunning);
            }
            input.device_scan_running = false;
            let form = &mut input.form;
            form.model = device.model;
            match device.serial {
                Some(serial) => {
                    form.serial_number = serial;
                    form.serial_from_system = true;
                }
                None => {
                    form.serial_number.clear();
                    form.serial_from_system = false;
                }
            }
            form.condition = Some(device.condition);
            return Ok(Transition::to(WizardState::Input(input))
                .with_effect(WizardEffect::Notify(device.message)));
        }
        WizardEvent::User(action) => action,
        other => return Err(invalid(WizardStep::Input, &other)),
    };

    let busy = input.device_scan_running;
    match action {
        UserAction::SelectCategory { category } => {
            if busy {
                return Err(WizardError::ScanInProgress);
            }
            input.form.category = Some(category);
            input.form.clear_device();
        }
        UserAction::SelectScanMode { mode } => {
            if busy {
                return Err(WizardError::ScanInProgress);
            }
            input.form.scan_mode = mode;
            input.form.clear_device();
            input.form.condition = match mode {
                ScanMode::SelfScan => input.form.condition.or(Some(DeviceCondition::Good)),
                ScanMode::VisualScan => None,
            };
        }
        UserAction::StartDeviceScan => {
            if busy {
                return Err(WizardError::ScanInProgress);
            }
            let category = input.form.category.ok_or(WizardError::CategoryRequired)?;
            input.device_scan_running = true;
            let mode = input.form.scan_mode;
            return Ok(Transition::to(WizardState::Input(input))
                .with_effect(WizardEffect::RunDeviceScan { category, mode }));
        }
        UserAction::SetModel { model } => {
            input.form.model = model;
        }
        UserAction::SetCondition { condition } => {
            if !input.form.scan_mode.condition_editable() {
                return Err(WizardError::ConditionLocked);
            }
            input.form.condition = Some(condition);
        }
        UserAction::SetSerialNumber { serial_number } => {
            if input.form.scan_mode == ScanMode::SelfScan && input.form.serial_from_system {
                return Err(WizardError::SerialLocked);
            }
            input.form.serial_number = serial_number;
        }
        UserAction::SetContractId { contract_id } => {
            input.form.contract_id = contract_id;
        }
        UserAction::AttachReceipt { file_name } => {
            input.form.receipt = Some(file_name);
        }
        UserAction::RequestAssessment => {
            if busy {
                return Err(WizardError::ScanInProgress);
            }
            let missing = input.form.missing_fields();
            if !missing.is_empty() {
                return Err(WizardError::IncompleteForm { missing });
            }
            input.consent_gate_open = true;
        }
        UserAction::CancelAssessment => {
            if !input.consent_gate_open {
                return Err(WizardError::GateNotOpen(Gate::AssessmentConsent));
            }
            input.consent_gate_open = false;
        }
        UserAction::ConfirmAssessment => {
            if busy {
                return Err(WizardError::ScanInProgress);
            }
            if !input.consent_gate_open {
                return Err(WizardError::GateNotOpen(Gate::AssessmentConsent));
            }
            let request = input.form.assessment_request(context)?;
            let effect = WizardEffect::CallValuationEngine {
                request: request.clone(),
                level: context.level,
            };
            return Ok(Transition::to(WizardState::Scanning(ScanningStep {
                form: input.form,
                request,
            }))
            .with_effect(effect));
        }
        other => return Err(invalid(WizardStep::Input, &WizardEvent::User(other))),
    }

    Ok(Transition::to(WizardState::Input(input)))
}

fn on_scanning(scanning: ScanningStep, event: WizardEvent) -> Result<Transition, WizardError> {
    match event {
        WizardEvent::AssessmentCompleted {
            assessment,
            prediction,
        } => Ok(Transition::to(WizardState::Results(ResultsStep {
            form: scanning.form,
            source: assessment.source,
            result: assessment.result,
            prediction,
            claimed_perks: BTreeSet::new(),
            trade_in_gate_open: false,
            voucher_issued: false,
        }))),
        WizardEvent::AssessmentFailed { reason } => {
            debug!(%reason, "assessment failed, returning to input");
            Ok(Transition::to(WizardState::Input(InputStep {
                form: scanning.form,
                device_scan_running: false,
                consent_gate_open: false,
            })))
        }
        other => Err(invalid(WizardStep::Scanning, &other)),
    }
}

fn on_results(mut results: ResultsStep, event: WizardEvent) -> Result<Transition, WizardError> {
    let action = match event {
        WizardEvent::User(action) => action,
        other => return Err(invalid(WizardStep::Results, &other)),
    };

    match action {
        UserAction::ClaimPerk { perk_id } => {
            if results.result.perk(&perk_id).is_none() {
                return Err(WizardError::UnknownPerk(perk_id));
            }
            if !results.claimed_perks.insert(perk_id.clone()) {
                return Err(WizardError::PerkAlreadyClaimed(perk_id));
            }
            Ok(Transition::to(WizardState::Results(results))
                .with_effect(WizardEffect::EmitCompletion(
                    CompletionEvent::PerkActivated { perk_id },
                ))
                .with_effect(WizardEffect::Notify(PERK_ACTIVATED_NOTICE.to_string())))
        }
        UserAction::OpenPhysicalTradeIn => {
            if results.voucher_issued {
                return Err(WizardError::VoucherAlreadyIssued);
            }
            results.trade_in_gate_open = true;
            Ok(Transition::to(WizardState::Results(results)))
        }
        UserAction::CancelPhysicalTradeIn => {
            if !results.trade_in_gate_open {
                return Err(WizardError::GateNotOpen(Gate::PhysicalTradeIn));
            }
            results.trade_in_gate_open = false;
            Ok(Transition::to(WizardState::Results(results)))
        }
        UserAction::ConfirmPhysicalTradeIn => {
            if !results.trade_in_gate_open {
                return Err(WizardError::GateNotOpen(Gate::PhysicalTradeIn));
            }
            results.trade_in_gate_open = false;
            let value = results.result.trade_in_value;
            if value == 0 {
                return Ok(Transition::to(WizardState::Results(results)));
            }
            results.voucher_issued = true;
            let notice = format!(
                "Provisional voucher for ₱{value} generated. Bring your {} to a partner store within 7 days to finalize.",
                results.form.model
            );
            Ok(Transition::to(WizardState::Results(results))
                .with_effect(WizardEffect::EmitCompletion(CompletionEvent::CashVoucher {
                    value,
                }))
                .with_effect(WizardEffect::Notify(notice)))
        }
        UserAction::Reset => Ok(Transition::to(WizardState::Input(InputStep {
            form: results.form.cleared_for_next_scan(),
            device_scan_running: false,
            consent_gate_open: false,
        }))),
        other => Err(invalid(WizardStep::Results, &WizardEvent::User(other))),
    }
}
