use serde::de::DeserializeOwned;

/// Reply that parsed as JSON but broke a field-level rule.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("reply did not contain a JSON object")]
    MissingObject,
    #[error("reply did not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("field `{field}` is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl DecodeError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Field-level checks run after a successful parse.
pub trait Validate {
    fn validate(&self) -> Result<(), DecodeError>;
}

/// Parses a model reply into `T` and validates it.
///
/// Models occasionally wrap JSON in markdown fences or add a sentence around it; only the
/// outermost `{ ... }` span is considered.
pub fn decode_json<T>(raw: &str) -> Result<T, DecodeError>
where
    T: DeserializeOwned + Validate,
{
    let body = json_object_span(raw).ok_or(DecodeError::MissingObject)?;
    let value: T = serde_json::from_str(body)?;
    value.validate()?;
    Ok(value)
}

fn json_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
