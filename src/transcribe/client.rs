//! Core `Transcriber` trait and `HttpTranscriber` implementation.
//!
//! `HttpTranscriber` posts the recorded audio as a multipart form body to
//! any endpoint that answers `{ "transcript": "..." }` — the `file` field
//! carries the payload bytes under the payload's own MIME tag. All
//! connection details come from [`TranscriptionConfig`]; nothing is
//! hardcoded.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::audio::AudioPayload;
use crate::config::TranscriptionConfig;

// ---------------------------------------------------------------------------
// TranscribeError
// ---------------------------------------------------------------------------

/// Errors that can occur while transcribing a recording.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("transcription request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("transcription endpoint returned {code}: {body}")]
    Status { code: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse transcription response: {0}")]
    Parse(String),

    /// The payload's MIME tag was rejected by the multipart builder.
    #[error("invalid audio MIME type: {0}")]
    InvalidMime(String),
}

impl From<reqwest::Error> for TranscribeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranscribeError::Timeout
        } else {
            TranscribeError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Transcriber trait
// ---------------------------------------------------------------------------

/// Async trait for audio transcription.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn Transcriber>`).
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Convert `payload` into text. The payload is consumed — one recording,
    /// one request.
    async fn transcribe(&self, payload: AudioPayload) -> Result<String, TranscribeError>;
}

// ---------------------------------------------------------------------------
// HttpTranscriber
// ---------------------------------------------------------------------------

/// Expected JSON shape of the transcription endpoint's answer.
#[derive(Deserialize)]
struct TranscriptResponse {
    transcript: String,
}

/// Posts audio to a remote transcription endpoint as a multipart form.
///
/// # No hardcoded URLs
/// All connection details (`url`, `api_key`, `timeout_secs`) come exclusively
/// from the [`TranscriptionConfig`] passed to [`HttpTranscriber::from_config`].
pub struct HttpTranscriber {
    client: reqwest::Client,
    config: TranscriptionConfig,
}

impl HttpTranscriber {
    /// Build an `HttpTranscriber` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &TranscriptionConfig) -> Self {
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
impl Transcriber for HttpTranscriber {
    /// Upload `payload` and return the endpoint's transcript.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// local backends that require no authentication.
    async fn transcribe(&self, payload: AudioPayload) -> Result<String, TranscribeError> {
        log::debug!(
            "transcribe: uploading {} bytes ({}, {:.1} s)",
            payload.bytes.len(),
            payload.mime,
            payload.duration_secs
        );

        let file_name = payload.file_name();
        let part = reqwest::multipart::Part::bytes(payload.bytes)
            .file_name(file_name)
            .mime_str(&payload.mime)
            .map_err(|e| TranscribeError::InvalidMime(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut req = self.client.post(&self.config.url).multipart(form);

        // Attach Authorization header only when api_key is a non-empty string.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let parsed: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::Parse(e.to_string()))?;

        log::debug!("transcribe: transcript = {:?}", parsed.transcript);
        Ok(parsed.transcript)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
