//! A small client for OpenAI-style chat completion APIs
//!
//! Authenticates with a bearer token, sends chat completion and model listing
//! requests, and reports failures as typed [`WrapperError`]s or, for the
//! convenience calls, as readable strings and empty results.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod observer;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use client::GptClient;
pub use config::ClientConfig;
pub use credentials::{Credential, CredentialSource, EnvCredentialSource, FixedCredentialSource};
pub use error::{ErrorKind, WrapperError, WrapperResult};
pub use models::{CompletionOptions, Message, MessageRole};
pub use observer::{NoopObserver, RequestEvent, RequestObserver, TracingObserver};
pub use types::ModelId;

/// Initialize the logging system
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
