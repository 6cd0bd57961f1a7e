//! Side channel for request diagnostics.
//!
//! The client never prints. Whatever used to be debug output is reported as a
//! [`RequestEvent`] to the configured [`RequestObserver`], which defaults to
//! [`NoopObserver`].

use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::error::WrapperError;

#[derive(Debug)]
pub enum RequestEvent<'a> {
    /// About to send.
    Request {
        method: &'a Method,
        url: &'a str,
        body: Option<&'a Value>,
    },
    /// Any HTTP status came back, including non-2xx.
    Response {
        url: &'a str,
        status: StatusCode,
        elapsed: Duration,
    },
    /// The operation failed; soft-failing operations report here too.
    Failure {
        operation: &'static str,
        error: &'a WrapperError,
    },
}

pub trait RequestObserver: Send + Sync {
    fn observe(&self, event: &RequestEvent<'_>);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn observe(&self, _event: &RequestEvent<'_>) {}
}

/// Forwards events to `tracing`. Bodies are only emitted at `trace` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn observe(&self, event: &RequestEvent<'_>) {
        match event {
            RequestEvent::Request { method, url, body } => {
                debug!(%method, url, "sending request");
                if let Some(body) = body {
                    trace!(%body, "request payload");
                }
            }
            RequestEvent::Response {
                url,
                status,
                elapsed,
            } => {
                debug!(url, status = status.as_u16(), ?elapsed, "received response");
            }
            RequestEvent::Failure { operation, error } => match error.hint() {
                Some(hint) => warn!(operation, %error, hint, "request failed"),
                None => warn!(operation, %error, "request failed"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tracing_observer_handles_every_event() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        let body = json!({"model": "gpt-4"});
        let error = WrapperError::Provider {
            status: StatusCode::UNAUTHORIZED,
            body: r#"{"error":{"message":"bad key"}}"#.to_string(),
        };

        tracing::subscriber::with_default(subscriber, || {
            let observer = TracingObserver;
            observer.observe(&RequestEvent::Request {
                method: &Method::POST,
                url: "http://localhost/v1/chat/completions",
                body: Some(&body),
            });
            observer.observe(&RequestEvent::Response {
                url: "http://localhost/v1/chat/completions",
                status: StatusCode::OK,
                elapsed: Duration::from_millis(12),
            });
            observer.observe(&RequestEvent::Failure {
                operation: "chat_completion",
                error: &error,
            });
            NoopObserver.observe(&RequestEvent::Failure {
                operation: "list_models",
                error: &error,
            });
        });
    }
}
