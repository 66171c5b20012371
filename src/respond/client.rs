//! Core `Responder` trait and `HttpResponder` implementation.
//!
//! `HttpResponder` posts `{ "prompt": "..." }` to any endpoint that answers
//! `{ "text": "..." }`. All connection details come from [`ResponseConfig`];
//! nothing is hardcoded.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ResponseConfig;

// ---------------------------------------------------------------------------
// RespondError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating a response.
#[derive(Debug, Error)]
pub enum RespondError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("response request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("response endpoint returned {code}: {body}")]
    Status { code: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse generation response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for RespondError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RespondError::Timeout
        } else {
            RespondError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Responder trait
// ---------------------------------------------------------------------------

/// Async trait for response generation.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn Responder>`).
#[async_trait]
pub trait Responder: Send + Sync {
    /// Generate a reply for `prompt`. The prompt is forwarded unchanged.
    async fn respond(&self, prompt: &str) -> Result<String, RespondError>;
}

// ---------------------------------------------------------------------------
// HttpResponder
// ---------------------------------------------------------------------------

/// Expected JSON shape of the generation endpoint's answer.
#[derive(Deserialize)]
struct GenerationResponse {
    text: String,
}

/// Posts prompts to a remote generation endpoint as JSON.
pub struct HttpResponder {
    client: reqwest::Client,
    config: ResponseConfig,
}

impl HttpResponder {
    /// Build an `HttpResponder` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ResponseConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Responder for HttpResponder {
    /// Send `prompt` to the configured endpoint and return the generated text.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// local backends that require no authentication.
    async fn respond(&self, prompt: &str) -> Result<String, RespondError> {
        log::debug!("respond: prompt = {:?}", prompt);

        let body = serde_json::json!({ "prompt": prompt });

        let mut req = self.client.post(&self.config.url).json(&body);

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RespondError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| RespondError::Parse(e.to_string()))?;

        log::debug!("respond: reply = {:?}", parsed.text);
        Ok(parsed.text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> ResponseConfig {
        ResponseConfig {
            url: "http://localhost:3000/api/chatgpt".into(),
            api_key: api_key.map(|s| s.to_string()),
            timeout_secs: 10,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let config = make_config(None);
        let _responder = HttpResponder::from_config(&config);
    }

    #[test]
    fn from_config_accepts_real_api_key() {
        let config = make_config(Some("sk-test-1234"));
        let _responder = HttpResponder::from_config(&config);
    }

    /// Verify that `HttpResponder` is object-safe (usable as `dyn Responder`).
    #[test]
    fn responder_is_object_safe() {
        let config = make_config(None);
        let responder: Box<dyn Responder> = Box::new(HttpResponder::from_config(&config));
        drop(responder);
    }

    #[test]
    fn generation_response_parses_expected_shape() {
        let parsed: GenerationResponse =
            serde_json::from_str(r#"{ "text": "Hi there" }"#).unwrap();
        assert_eq!(parsed.text, "Hi there");
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::json!({ "prompt": "Hello" });
        assert_eq!(body.to_string(), r#"{"prompt":"Hello"}"#);
    }
}
