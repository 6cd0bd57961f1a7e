use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{WrapperError, WrapperResult};
use crate::types::ModelId;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Per-call sampling parameters and provider passthrough options
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f64,
    pub max_tokens: u32,
    /// Merged into the body after the named fields, so a key here shadows
    /// `model`, `messages`, `temperature` or `max_tokens`.
    pub extra: Map<String, Value>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            extra: Map::new(),
        }
    }
}

impl CompletionOptions {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: ModelId,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl CompletionRequest {
    pub fn new(model: ModelId, messages: Vec<Message>, options: CompletionOptions) -> Self {
        Self {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            extra: options.extra,
        }
    }

    pub fn validate(&self) -> WrapperResult<()> {
        if self.messages.is_empty() {
            return Err(WrapperError::InvalidRequest(
                "conversation must contain at least one message".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(WrapperError::InvalidRequest(
                "max_tokens must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Wire body: the named fields, then every `extra` entry (last write wins).
    pub fn to_body(&self) -> WrapperResult<Value> {
        let mut body = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut body {
            for (key, value) in &self.extra {
                fields.insert(key.clone(), value.clone());
            }
        }
        Ok(body)
    }
}

/// Model information
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: String,
}

/// Models list response
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub data: Vec<ModelInfo>,
}

impl ModelsResponse {
    pub fn into_ids(self) -> Vec<String> {
        self.data.into_iter().map(|model| model.id).collect()
    }
}
