//! Gateway to the hosted generative language model.
//!
//! Every caller in this crate treats the model as unreliable: a [`ModelError`] or a reply that
//! fails [`decode`] is replaced by a deterministic fallback at the call site, so nothing here is
//! ever surfaced to end users.

pub mod decode;
mod gemini;

pub use decode::{decode_json, DecodeError, Validate};
pub use gemini::GeminiClient;

use async_trait::async_trait;

/// Single completion call: prompt plus optional system instruction and output hints.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    pub json_output: bool,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            temperature: None,
            json_output: false,
        }
    }

    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            json_output: true,
            ..Self::text(prompt)
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Text-completion seam so workflows can be exercised without network access.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ModelError>;
}

/// Failure talking to the model. Always recovered locally by the caller.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("language model is not configured")]
    Offline,
    #[error("model transport failed: {0}")]
    Transport(String),
    #[error("model endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned no candidate text")]
    EmptyResponse,
}

impl From<reqwest::Error> for ModelError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

/// Model used when no API key is configured; every call fails so fallbacks take over.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineModel;

#[async_trait]
impl LanguageModel for OfflineModel {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, ModelError> {
        Err(ModelError::Offline)
    }
}

/// Runs the request and maps empty replies to [`ModelError::EmptyResponse`].
pub async fn generate_text(
    model: &dyn LanguageModel,
    request: GenerationRequest,
) -> Result<String, ModelError> {
    let text = model.generate(request).await?;
    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    #[async_trait]
    impl LanguageModel for Echo {
        async fn generate(&self, _request: GenerationRequest) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn offline_model_always_fails() {
        let err = OfflineModel
            .generate(GenerationRequest::text("hello"))
            .await
            .expect_err("offline model fails");
        assert!(matches!(err, ModelError::Offline));
    }

    #[tokio::test]
    async fn blank_replies_are_treated_as_errors() {
        let err = generate_text(&Echo("  \n"), GenerationRequest::text("hello"))
            .await
            .expect_err("blank reply rejected");
        assert!(matches!(err, ModelError::EmptyResponse));

        let text = generate_text(&Echo("hi there"), GenerationRequest::text("hello"))
            .await
            .expect("text reply accepted");
        assert_eq!(text, "hi there");
    }

    #[test]
    fn json_requests_carry_output_hint() {
        let request = GenerationRequest::json("{}")
            .with_system_instruction("be brief")
            .with_temperature(0.7);
        assert!(request.json_output);
        assert_eq!(request.system_instruction.as_deref(), Some("be brief"));
        assert_eq!(request.temperature, Some(0.7));
    }
}
