use metrics::{counter, histogram};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::credentials::{resolve_credential, Credential, CredentialSource, EnvCredentialSource};
use crate::error::{WrapperError, WrapperResult};
use crate::models::{CompletionOptions, CompletionRequest, Message, ModelsResponse};
use crate::observer::{NoopObserver, RequestEvent, RequestObserver};
use crate::types::ModelId;
use crate::utils::{assistant_content, error_description};

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
const MODELS_PATH: &str = "models";

/// Client for an OpenAI-style chat completion API.
///
/// Holds only immutable state, so one instance can serve any number of
/// concurrent calls. Each call is a single request with no retry.
#[derive(Clone)]
pub struct GptClient {
    http: Client,
    model: ModelId,
    base_url: String,
    timeout: Option<Duration>,
    credential: Credential,
    headers: HeaderMap,
    observer: Arc<dyn RequestObserver>,
}

impl GptClient {
    /// Falls back to `OPENAI_API_KEY` when `config.api_key` is unset.
    pub fn new(config: &ClientConfig) -> WrapperResult<Self> {
        Self::with_credential_source(config, &EnvCredentialSource::default())
    }

    pub fn with_credential_source(
        config: &ClientConfig,
        source: &dyn CredentialSource,
    ) -> WrapperResult<Self> {
        let credential = resolve_credential(config.api_key.as_deref(), source)?;
        let base_url = normalize_base_url(&config.base_url)?;
        let headers = default_headers(&credential)?;

        let timeout = config.timeout();
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            WrapperError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;

        debug!(
            model = %config.model,
            base_url = %base_url,
            credential = %credential.masked(),
            "client configured"
        );
        Ok(Self {
            http,
            model: config.model.clone(),
            base_url,
            timeout,
            credential,
            headers,
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Headers attached to every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// POST `{base_url}/chat/completions` and return the decoded body as is.
    ///
    /// Every failure, whether local validation, transport or a non-2xx
    /// status, is returned as `Err`. [`WrapperError::to_payload`] gives the
    /// `{"error": ...}` object form.
    pub async fn chat_completion(
        &self,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> WrapperResult<Value> {
        let result = self.send_chat(messages, options).await;
        if let Err(error) = &result {
            self.observer.observe(&RequestEvent::Failure {
                operation: "chat_completion",
                error,
            });
        }
        result
    }

    async fn send_chat(
        &self,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> WrapperResult<Value> {
        if !(0.0..=2.0).contains(&options.temperature) {
            warn!(
                temperature = options.temperature,
                "temperature outside the usual 0-2 range"
            );
        }
        let request = CompletionRequest::new(self.model.clone(), messages, options);
        request.validate()?;
        let body = request.to_body()?;
        self.execute(Method::POST, CHAT_COMPLETIONS_PATH, Some(&body))
            .await
    }

    /// Send `prompt` (after an optional system message) and return the
    /// assistant's reply text.
    ///
    /// Never fails: errors come back as a string starting with `Error`.
    pub async fn simple_completion(&self, prompt: &str, system_message: Option<&str>) -> String {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_message.filter(|text| !text.is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));

        match self
            .chat_completion(messages, CompletionOptions::default())
            .await
        {
            Ok(body) => self.completion_text(&body),
            Err(error) => format!("Error: {error}"),
        }
    }

    fn completion_text(&self, body: &Value) -> String {
        let (error, text) = match body.get("error") {
            Some(payload) => {
                let description = error_description(payload);
                let text = format!("Error: {description}");
                (WrapperError::ErrorPayload(description), text)
            }
            None => match assistant_content(body) {
                Ok(content) => return content.to_string(),
                Err(error) => {
                    let text = format!("Error parsing response: {error}");
                    (error, text)
                }
            },
        };
        self.observer.observe(&RequestEvent::Failure {
            operation: "simple_completion",
            error: &error,
        });
        text
    }

    /// Model ids from `{base_url}/models`, in provider order.
    ///
    /// Soft-fails to an empty list; the error goes to the observer. See
    /// [`GptClient::try_list_models`] for the typed form.
    pub async fn list_models(&self) -> Vec<String> {
        match self.try_list_models().await {
            Ok(ids) => ids,
            Err(error) => {
                self.observer.observe(&RequestEvent::Failure {
                    operation: "list_models",
                    error: &error,
                });
                Vec::new()
            }
        }
    }

    pub async fn try_list_models(&self) -> WrapperResult<Vec<String>> {
        let body = self.execute(Method::GET, MODELS_PATH, None).await?;
        let models: ModelsResponse = serde_json::from_value(body)?;
        Ok(models.into_ids())
    }

    async fn execute(
        &self,
        method: Method,
        path: &'static str,
        body: Option<&Value>,
    ) -> WrapperResult<Value> {
        let url = format!("{}/{}", self.base_url, path);
        self.observer.observe(&RequestEvent::Request {
            method: &method,
            url: &url,
            body,
        });

        let mut request = self
            .http
            .request(method, &url)
            .headers(self.headers.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let start = Instant::now();
        let resp = self.round_trip(request, &url, start).await;
        histogram!("gpt_wrapper_request_latency_seconds", start.elapsed().as_secs_f64(), "endpoint" => path);
        let result = if resp.is_ok() { "success" } else { "error" };
        counter!("gpt_wrapper_requests_total", 1, "endpoint" => path, "result" => result);
        resp
    }

    async fn round_trip(
        &self,
        request: RequestBuilder,
        url: &str,
        start: Instant,
    ) -> WrapperResult<Value> {
        let resp = request
            .send()
            .await
            .map_err(|e| WrapperError::from_transport(e, self.timeout))?;
        let status = resp.status();
        self.observer.observe(&RequestEvent::Response {
            url,
            status,
            elapsed: start.elapsed(),
        });

        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(WrapperError::Provider { status, body });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| WrapperError::from_transport(e, self.timeout))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn normalize_base_url(raw: &str) -> WrapperResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|e| WrapperError::Configuration(format!("invalid base URL `{raw}`: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(WrapperError::Configuration(format!(
            "base URL `{raw}` must use http or https"
        )));
    }
    Ok(trimmed.to_string())
}

fn default_headers(credential: &Credential) -> WrapperResult<HeaderMap> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
        .map_err(|_| {
            WrapperError::Configuration("API key contains characters not allowed in a header".into())
        })?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(AUTHORIZATION, auth);
    Ok(headers)
}
