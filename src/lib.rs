//! Talkmatic — a voice conversation loop.
//!
//! Records microphone audio, sends it to a remote transcription endpoint,
//! forwards the transcript to a remote response-generation endpoint, and
//! speaks the reply through a system text-to-speech engine.
//!
//! # Architecture
//!
//! ```text
//! SessionCommand (mpsc)
//!        │
//!        ▼
//! SessionOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ StartRecording → Recorder::start()              [Recording]
//!        │
//!        ├─ StopRecording  → Recorder::stop() → AudioPayload
//!        │     └─▶ spawn: Transcriber::transcribe()         [AwaitingTranscript]
//!        │              └─▶ Responder::respond()            [AwaitingResponse]
//!        │                     └─▶ Speaker::speak()         [Idle, reply set]
//!        │
//!        └─ SubmitText → spawn: respond → speak  (skips the audio path)
//!
//! SharedSession (Arc<Mutex<SessionState>>) ←── read by the shell / tests
//! ```
//!
//! Every capability sits behind a trait ([`audio::Recorder`],
//! [`transcribe::Transcriber`], [`respond::Responder`], [`speak::Speaker`])
//! so tests substitute mocks for the microphone, the HTTP backend and the
//! speech engine.

pub mod audio;
pub mod config;
pub mod respond;
pub mod session;
pub mod speak;
pub mod transcribe;
