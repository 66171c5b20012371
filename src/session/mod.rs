//! Session orchestration — the conversation state machine.
//!
//! This module wires the record → transcribe → respond → speak loop and
//! exposes the shared state the shell reads between commands.
//!
//! # Architecture
//!
//! ```text
//! SessionCommand (mpsc)
//!        │
//!        ▼
//! SessionOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ StartRecording → Recorder::start()       [Recording]
//!        ├─ StopRecording  → Recorder::stop()
//!        │      └─ spawn exchange: transcribe → respond → speak
//!        └─ SubmitText     → spawn exchange: respond → speak
//!
//! SharedSession (Arc<Mutex<SessionState>>) ←── read by shell / tests
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use talkmatic::session::{new_shared_session, SessionOrchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = new_shared_session();
//!
//!     // (capabilities constructed from config)
//!     # use talkmatic::audio::Recorder;
//!     # use talkmatic::respond::Responder;
//!     # use talkmatic::speak::Speaker;
//!     # use talkmatic::transcribe::Transcriber;
//!     # fn make_recorder() -> Box<dyn Recorder> { unimplemented!() }
//!     # fn make_transcriber() -> Arc<dyn Transcriber> { unimplemented!() }
//!     # fn make_responder() -> Arc<dyn Responder> { unimplemented!() }
//!     # fn make_speaker() -> Arc<dyn Speaker> { unimplemented!() }
//!
//!     let (command_tx, command_rx) = mpsc::channel(16);
//!     let (event_tx, _event_rx) = mpsc::channel(32);
//!     let orchestrator = SessionOrchestrator::new(
//!         session.clone(),
//!         make_recorder(),
//!         make_transcriber(),
//!         make_responder(),
//!         make_speaker(),
//!         "en-US".into(),
//!         event_tx,
//!     );
//!
//!     tokio::spawn(async move { orchestrator.run(command_rx).await });
//!
//!     // command_tx is driven by the shell / UI
//!     # drop(command_tx);
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{SessionCommand, SessionEvent, SessionOrchestrator};
pub use state::{new_shared_session, SessionPhase, SessionState, SharedSession};
