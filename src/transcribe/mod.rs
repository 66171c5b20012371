//! Transcription client — audio payload → text over HTTP.
//!
//! This module provides:
//! * [`Transcriber`] — async trait implemented by all transcription backends.
//! * [`HttpTranscriber`] — multipart-upload client for a remote endpoint.
//! * [`TranscribeError`] — error variants for transcription operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use talkmatic::audio::AudioPayload;
//! use talkmatic::config::AppConfig;
//! use talkmatic::transcribe::{HttpTranscriber, Transcriber};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let transcriber = HttpTranscriber::from_config(&config.transcription);
//!
//!     let payload = AudioPayload {
//!         bytes: std::fs::read("speech.wav").unwrap(),
//!         mime: "audio/wav".into(),
//!         duration_secs: 2.0,
//!     };
//!     let transcript = transcriber.transcribe(payload).await.unwrap();
//!     println!("{transcript}");
//! }
//! ```

pub mod client;

pub use client::{HttpTranscriber, TranscribeError, Transcriber};
