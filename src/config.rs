use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::ModelId;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client settings fixed at construction.
///
/// `api_key` is never serialized; when it is absent the client falls back to
/// its credential source (the `OPENAI_API_KEY` environment variable by
/// default).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub model: ModelId,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: ModelId::default(),
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn with_model(mut self, model: impl Into<ModelId>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
