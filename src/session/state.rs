//! Session state machine and shared conversation state.
//!
//! [`SessionPhase`] drives the orchestrator's state machine. [`SessionState`]
//! is the single source of truth for the conversation: current phase, the
//! latest input text (typed or transcribed) and the latest generated reply.
//!
//! [`SharedSession`] is a type alias for `Arc<Mutex<SessionState>>` — cheap
//! to clone and safe to share across tasks.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Phases of the conversation loop.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──start ok──▶ Recording ──stop ok──▶ AwaitingTranscript
///                              ──stop err─▶ Idle (no payload)
/// AwaitingTranscript ──transcript ok──▶ AwaitingResponse
///                    ──transcript err─▶ Idle (input text retained)
/// AwaitingResponse ──reply ok──▶ Idle (reply set, playback fires)
///                  ──reply err─▶ Idle (reply unchanged, no playback)
/// Idle ──manual submit──▶ AwaitingResponse  (skips the audio path)
/// ```
///
/// There is no terminal phase; the loop is cyclic by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the user to start recording or submit text.
    Idle,

    /// Microphone capture is active.
    Recording,

    /// A recording has been finalised; the transcription request is in flight.
    AwaitingTranscript,

    /// A prompt has been sent; the generation request is in flight.
    AwaitingResponse,
}

impl SessionPhase {
    /// Returns `true` while the loop is recording or has a request in flight.
    ///
    /// ```
    /// use talkmatic::session::SessionPhase;
    ///
    /// assert!(!SessionPhase::Idle.is_busy());
    /// assert!(SessionPhase::Recording.is_busy());
    /// assert!(SessionPhase::AwaitingTranscript.is_busy());
    /// assert!(SessionPhase::AwaitingResponse.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(self, SessionPhase::Idle)
    }

    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Recording => "Recording",
            SessionPhase::AwaitingTranscript => "Transcribing",
            SessionPhase::AwaitingResponse => "Thinking",
        }
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Shared conversation state — mutated only by the session orchestrator and
/// its spawned exchange tasks; destroyed on teardown, never persisted.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Current phase of the conversation loop.
    pub phase: SessionPhase,

    /// The latest prompt text: either the last transcript or the last
    /// manually submitted line. Empty until the first exchange.
    pub input_text: String,

    /// The latest generated reply. Empty until the first successful
    /// generation; left untouched by failed requests.
    pub response_text: String,
}

impl SessionState {
    /// The recording flag of the data model: true exactly while capturing.
    pub fn recording(&self) -> bool {
        self.phase == SessionPhase::Recording
    }
}

// ---------------------------------------------------------------------------
// SharedSession
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionState`].
///
/// Cheap to clone (`Arc` clone). Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedSession`] wrapping a default [`SessionState`].
pub fn new_shared_session() -> SharedSession {
    Arc::new(Mutex::new(SessionState::default()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
