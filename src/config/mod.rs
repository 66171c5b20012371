//! Configuration module for Talkmatic.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the two HTTP
//! endpoints and the speech engine, `AppPaths` for cross-platform config
//! directories, and TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, ResponseConfig, SpeechConfig, TranscriptionConfig};
