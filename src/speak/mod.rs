//! Spoken playback of generated responses.
//!
//! [`Speaker`] is the capability trait the session orchestrator fires after
//! every response update; [`CommandSpeaker`] is the live implementation that
//! hands the utterance to a system TTS program.
//!
//! Playback is request-only: nothing waits for the utterance to finish, and
//! overlapping utterances are left to the speech engine's own queuing.

use std::process::{Command, Stdio};

use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeakError
// ---------------------------------------------------------------------------

/// Errors that can occur when handing an utterance to the speech engine.
#[derive(Debug, Error)]
pub enum SpeakError {
    /// The TTS program could not be spawned (missing binary, permissions …).
    #[error("cannot launch speech program {program:?}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Speaker trait
// ---------------------------------------------------------------------------

/// Capability trait for spoken playback.
///
/// `speak` must return as soon as the utterance has been handed off — it is
/// fire-and-forget, with no acknowledgment of playback completion.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str, language: &str) -> Result<(), SpeakError>;
}

// ---------------------------------------------------------------------------
// CommandSpeaker
// ---------------------------------------------------------------------------

/// Speaks by spawning a system TTS program (`espeak-ng` by default).
///
/// The program is invoked as `<program> -v <language> <text>`; its stdout and
/// stderr are discarded. The spawned child is reaped by a detached thread so
/// the caller never blocks on playback.
pub struct CommandSpeaker {
    program: String,
}

impl CommandSpeaker {
    /// Create a speaker that invokes `program` for each utterance.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandSpeaker {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str, language: &str) -> Result<(), SpeakError> {
        log::debug!("speak: {} chars via {:?} ({language})", text.len(), self.program);

        let mut child = Command::new(&self.program)
            .arg("-v")
            .arg(language)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpeakError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        // Reap the child off-thread; playback completion is never awaited.
        std::thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
