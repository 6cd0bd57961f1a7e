//! Bearer token resolution.
//!
//! Resolution order:
//! 1. Explicit key from [`ClientConfig::api_key`](crate::ClientConfig).
//! 2. The injected [`CredentialSource`], by default the `OPENAI_API_KEY`
//!    environment variable.
//!
//! Empty strings count as absent at every step.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::error::{EnvVarError, WrapperResult};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Bearer token used in the `Authorization` header
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Returns `None` for an empty token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            return None;
        }
        Some(Self(SecretString::from(token)))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// `abcde...wxyz` for tokens longer than ten characters, `****` otherwise.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.expose().chars().collect();
        if chars.len() <= 10 {
            return "****".to_string();
        }
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

/// Fallback strategy consulted when no explicit key is configured
pub trait CredentialSource: Send + Sync {
    /// Name shown in the error when nothing resolves.
    fn name(&self) -> &str;
    fn resolve(&self) -> Option<String>;
}

/// Reads the token from a process environment variable
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    var: String,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::new(API_KEY_ENV)
    }
}

impl CredentialSource for EnvCredentialSource {
    fn name(&self) -> &str {
        &self.var
    }

    fn resolve(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// A fixed value, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct FixedCredentialSource {
    value: Option<String>,
}

impl FixedCredentialSource {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl CredentialSource for FixedCredentialSource {
    fn name(&self) -> &str {
        API_KEY_ENV
    }

    fn resolve(&self) -> Option<String> {
        self.value.clone()
    }
}

pub fn resolve_credential(
    explicit: Option<&str>,
    fallback: &dyn CredentialSource,
) -> WrapperResult<Credential> {
    if let Some(credential) = explicit.and_then(Credential::new) {
        return Ok(credential);
    }
    fallback.resolve().and_then(Credential::new).ok_or_else(|| {
        EnvVarError {
            var: fallback.name().to_string(),
            instructions: Some(format!(
                "Set your API key with: export {}=your-key-here",
                fallback.name()
            )),
        }
        .into()
    })
}
