//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// TranscriptionConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-to-text endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Full URL of the transcription endpoint. Receives a multipart POST
    /// with a `file` field and answers `{ "transcript": "..." }`.
    pub url: String,
    /// API key — `None` (or empty) for unauthenticated backends.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for a transcription response.
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/api/whisper".into(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// ResponseConfig
// ---------------------------------------------------------------------------

/// Settings for the response-generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Full URL of the generation endpoint. Receives a JSON POST
    /// `{ "prompt": "..." }` and answers `{ "text": "..." }`.
    pub url: String,
    /// API key — `None` (or empty) for unauthenticated backends.
    pub api_key: Option<String>,
    /// Maximum seconds to wait for a generated response.
    pub timeout_secs: u64,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/api/chatgpt".into(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for spoken playback of generated responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// TTS program invoked for playback (must accept `-v <language> <text>`).
    pub program: String,
    /// Language tag passed to the TTS program (e.g. `"en-US"`).
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".into(),
            language: "en-US".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use talkmatic::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Transcription endpoint settings.
    pub transcription: TranscriptionConfig,
    /// Response-generation endpoint settings.
    pub response: ResponseConfig,
    /// Spoken playback settings.
    pub speech: SpeechConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.transcription.url, loaded.transcription.url);
        assert_eq!(original.transcription.api_key, loaded.transcription.api_key);
        assert_eq!(
            original.transcription.timeout_secs,
            loaded.transcription.timeout_secs
        );

        assert_eq!(original.response.url, loaded.response.url);
        assert_eq!(original.response.api_key, loaded.response.api_key);
        assert_eq!(original.response.timeout_secs, loaded.response.timeout_secs);

        assert_eq!(original.speech.program, loaded.speech.program);
        assert_eq!(original.speech.language, loaded.speech.language);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.transcription.url, default.transcription.url);
        assert_eq!(config.response.url, default.response.url);
        assert_eq!(config.speech.language, default.speech.language);
    }

    /// Verify the documented default values.
    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.transcription.url, "http://localhost:3000/api/whisper");
        assert!(cfg.transcription.api_key.is_none());
        assert_eq!(cfg.transcription.timeout_secs, 30);
        assert_eq!(cfg.response.url, "http://localhost:3000/api/chatgpt");
        assert!(cfg.response.api_key.is_none());
        assert_eq!(cfg.speech.program, "espeak-ng");
        assert_eq!(cfg.speech.language, "en-US");
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.transcription.url = "https://stt.example.com/v1/transcribe".into();
        cfg.transcription.api_key = Some("sk-test".into());
        cfg.transcription.timeout_secs = 60;
        cfg.response.url = "https://llm.example.com/v1/respond".into();
        cfg.speech.program = "say".into();
        cfg.speech.language = "en-GB".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.transcription.url, "https://stt.example.com/v1/transcribe");
        assert_eq!(loaded.transcription.api_key, Some("sk-test".into()));
        assert_eq!(loaded.transcription.timeout_secs, 60);
        assert_eq!(loaded.response.url, "https://llm.example.com/v1/respond");
        assert_eq!(loaded.speech.program, "say");
        assert_eq!(loaded.speech.language, "en-GB");
    }
}
