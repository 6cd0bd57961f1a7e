use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::utils::provider_error_message;

pub type WrapperResult<T> = std::result::Result<T, WrapperError>;

/// Main error type for the wrapper
#[derive(Error, Debug)]
pub enum WrapperError {
    /// No bearer token could be resolved at construction
    #[error(transparent)]
    MissingCredential(#[from] EnvVarError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Request rejected locally before it was sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, DNS or other network failure
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-2xx response from the provider
    #[error("provider returned {status}: {}", provider_error_message(.body))]
    Provider { status: StatusCode, body: String },

    /// 2xx body carrying an `error` object
    #[error("provider reported an error: {0}")]
    ErrorPayload(String),

    /// Response body did not have the expected shape
    #[error("unexpected response shape: {0}")]
    Shape(String),

    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of [`WrapperError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    InvalidRequest,
    Transport,
    Provider,
    Shape,
}

/// Missing credential environment variable
#[derive(Debug)]
pub struct EnvVarError {
    /// Name of the environment variable that is missing
    pub var: String,
    /// Optional instructions to help the user get a valid value
    pub instructions: Option<String>,
}

impl std::fmt::Display for EnvVarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "API key must be provided or set as the `{}` environment variable",
            self.var
        )?;
        if let Some(instructions) = &self.instructions {
            write!(f, ". {}", instructions)?;
        }
        Ok(())
    }
}

impl std::error::Error for EnvVarError {}

impl WrapperError {
    /// Classify a reqwest failure, keeping timeouts distinct.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(limit) if err.is_timeout() => WrapperError::Timeout(limit),
            _ => WrapperError::Transport(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WrapperError::MissingCredential(_) | WrapperError::Configuration(_) => {
                ErrorKind::Configuration
            }
            WrapperError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            WrapperError::Timeout(_) | WrapperError::Transport(_) => ErrorKind::Transport,
            WrapperError::Provider { .. } | WrapperError::ErrorPayload(_) => ErrorKind::Provider,
            WrapperError::Shape(_) | WrapperError::Json(_) => ErrorKind::Shape,
        }
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            WrapperError::Provider { status, .. } => Some(*status),
            WrapperError::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Suggested next step for common provider failures
    pub fn hint(&self) -> Option<&'static str> {
        match self.status_code()? {
            StatusCode::UNAUTHORIZED => Some(
                "the API key may be invalid or expired, or the account may have billing issues",
            ),
            StatusCode::NOT_FOUND => Some(
                "check the model name, that the account has access to it, and the base URL",
            ),
            StatusCode::TOO_MANY_REQUESTS => Some("rate limit or quota exceeded; wait and retry"),
            _ => None,
        }
    }

    /// Render as the `{"error": "..."}` object returned by the untyped API.
    pub fn to_payload(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn provider(status: StatusCode, body: &str) -> WrapperError {
        WrapperError::Provider {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn provider_error_prefers_message_field() {
        let err = provider(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "provider returned 401 Unauthorized: Incorrect API key provided"
        );
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.status_code(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn provider_error_falls_back_to_raw_body() {
        let err = provider(StatusCode::BAD_GATEWAY, "upstream unavailable");
        assert_eq!(
            err.to_string(),
            "provider returned 502 Bad Gateway: upstream unavailable"
        );
        assert!(err.hint().is_none());
    }

    #[test]
    fn hints_cover_auth_and_missing_model() {
        assert!(provider(StatusCode::UNAUTHORIZED, "")
            .hint()
            .unwrap()
            .contains("API key"));
        assert!(provider(StatusCode::NOT_FOUND, "")
            .hint()
            .unwrap()
            .contains("model name"));
        assert!(WrapperError::Shape("x".into()).hint().is_none());
    }

    #[test]
    fn payload_wraps_display_text() {
        let err = WrapperError::InvalidRequest("conversation is empty".into());
        assert_eq!(
            err.to_payload(),
            json!({ "error": "invalid request: conversation is empty" })
        );
    }

    #[test]
    fn error_payload_is_provider_kind_without_status() {
        let err = WrapperError::ErrorPayload("model overloaded".into());
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "provider reported an error: model overloaded");
    }

    #[test]
    fn missing_credential_is_configuration_kind() {
        let err = WrapperError::from(EnvVarError {
            var: "OPENAI_API_KEY".into(),
            instructions: Some("Set it with: export OPENAI_API_KEY=your-key-here".into()),
        });
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let text = err.to_string();
        assert!(text.contains("`OPENAI_API_KEY`"));
        assert!(text.ends_with("export OPENAI_API_KEY=your-key-here"));
    }
}
