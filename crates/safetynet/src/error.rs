use crate::config::ConfigError;
use crate::llm::ModelError;
use crate::telemetry::TelemetryError;
use crate::workflows::tradein::{PriceTableImportError, TradeInServiceError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    PriceTable(PriceTableImportError),
    Model(ModelError),
    TradeIn(TradeInServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::PriceTable(err) => write!(f, "price table error: {}", err),
            AppError::Model(err) => write!(f, "model client error: {}", err),
            AppError::TradeIn(err) => write!(f, "trade-in error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::PriceTable(err) => Some(err),
            AppError::Model(err) => Some(err),
            AppError::TradeIn(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::TradeIn(TradeInServiceError::Locked) => StatusCode::FORBIDDEN,
            AppError::TradeIn(TradeInServiceError::Wizard(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TradeIn(TradeInServiceError::Repository(
                crate::workflows::tradein::SessionRepositoryError::NotFound,
            )) => StatusCode::NOT_FOUND,
            AppError::Model(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::PriceTable(_)
            | AppError::TradeIn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<PriceTableImportError> for AppError {
    fn from(value: PriceTableImportError) -> Self {
        Self::PriceTable(value)
    }
}

impl From<ModelError> for AppError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

impl From<TradeInServiceError> for AppError {
    fn from(value: TradeInServiceError) -> Self {
        Self::TradeIn(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tradein::{RequiredField, WizardError};

    #[test]
    fn trade_in_errors_map_to_client_statuses() {
        let locked = AppError::from(TradeInServiceError::Locked).into_response();
        assert_eq!(locked.status(), StatusCode::FORBIDDEN);

        let wizard = AppError::from(TradeInServiceError::Wizard(WizardError::IncompleteForm {
            missing: vec![RequiredField::Receipt],
        }))
        .into_response();
        assert_eq!(wizard.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn display_names_the_failing_layer() {
        let err = AppError::from(ConfigError::InvalidPort);
        assert!(err.to_string().starts_with("configuration error:"));
    }
}
