//! Session orchestrator — drives the record → transcribe → respond → speak loop.
//!
//! [`SessionOrchestrator`] owns the [`SharedSession`] and responds to
//! [`SessionCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Control flow
//!
//! ```text
//! SessionCommand::StartRecording
//!   └─▶ Recorder::start() → phase = Recording
//!
//! SessionCommand::StopRecording
//!   └─▶ Recorder::stop() → AudioPayload → phase = AwaitingTranscript
//!         └─▶ spawn: transcribe → input set, phase = AwaitingResponse
//!                      └─▶ respond → reply set, phase = Idle → speak
//!
//! SessionCommand::SubmitText(text)
//!   └─▶ input set, phase = AwaitingResponse
//!         └─▶ spawn: respond → reply set, phase = Idle → speak
//! ```
//!
//! Each exchange runs as its own spawned task with no cancellation or
//! sequencing token. Starting a new exchange while one is in flight lets both
//! complete, and whichever resolves last wins the session-state write. That
//! last-write-wins behaviour is deliberate; see the crate's DESIGN notes.
//!
//! All failures (device, network, playback) are logged and collapse the phase
//! back to [`SessionPhase::Idle`] without touching the fields they did not
//! produce — a failed transcription keeps the previous input text, a failed
//! generation keeps the previous reply and fires no playback.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio::Recorder;
use crate::respond::Responder;
use crate::speak::Speaker;
use crate::transcribe::Transcriber;

use super::state::{SessionPhase, SharedSession};

// ---------------------------------------------------------------------------
// Command / event types
// ---------------------------------------------------------------------------

/// Commands sent from the shell (or a UI) to the session orchestrator.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Begin microphone capture.
    StartRecording,
    /// End microphone capture and run the full voice exchange.
    StopRecording,
    /// Submit typed text, skipping the audio path entirely.
    SubmitText(String),
}

/// Progress events delivered from the orchestrator to the shell.
///
/// Failures are not events: per the source behaviour they are logged to the
/// diagnostic channel and never surfaced as visible state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Microphone capture began.
    RecordingStarted,
    /// Capture ended; the transcription request is on its way.
    RecordingStopped { duration_secs: f32 },
    /// The transcript came back and was stored as the input text.
    TranscriptReady { text: String },
    /// The generated reply came back, was stored, and playback was triggered.
    ResponseReady { text: String },
}

// ---------------------------------------------------------------------------
// SessionOrchestrator
// ---------------------------------------------------------------------------

/// Drives the complete conversation loop.
///
/// Create with [`SessionOrchestrator::new`], then call [`run`](Self::run)
/// inside a tokio task.
pub struct SessionOrchestrator {
    session: SharedSession,
    recorder: Box<dyn Recorder>,
    transcriber: Arc<dyn Transcriber>,
    responder: Arc<dyn Responder>,
    speaker: Arc<dyn Speaker>,
    /// Language tag handed to the speaker with every utterance.
    language: String,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl SessionOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `session`     — shared conversation state (also read by the shell).
    /// * `recorder`    — microphone controller (e.g. `MicRecorder`).
    /// * `transcriber` — transcription client (e.g. `HttpTranscriber`).
    /// * `responder`   — generation client (e.g. `HttpResponder`).
    /// * `speaker`     — playback capability (e.g. `CommandSpeaker`).
    /// * `language`    — fixed language tag for playback (e.g. `"en-US"`).
    /// * `event_tx`    — progress feed back to the shell.
    pub fn new(
        session: SharedSession,
        recorder: Box<dyn Recorder>,
        transcriber: Arc<dyn Transcriber>,
        responder: Arc<dyn Responder>,
        speaker: Arc<dyn Speaker>,
        language: String,
        event_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            session,
            recorder,
            transcriber,
            responder,
            speaker,
            language,
            event_tx,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the orchestrator until `command_rx` is closed.
    ///
    /// This is an `async fn` and should be spawned as a tokio task from
    /// `main()`. It never returns while the channel is open. Exchanges
    /// spawned by it may still be in flight when it returns.
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<SessionCommand>) {
        while let Some(command) = command_rx.recv().await {
            match command {
                SessionCommand::StartRecording => self.handle_start().await,
                SessionCommand::StopRecording => self.handle_stop().await,
                SessionCommand::SubmitText(text) => self.handle_submit(text).await,
            }
        }

        log::info!("session: command channel closed, orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    /// Begin capture. Only reachable while the recording flag is false; a
    /// failure leaves the flag false and is logged, never surfaced.
    async fn handle_start(&mut self) {
        match self.recorder.start() {
            Ok(()) => {
                log::debug!("session: recording started");
                self.set_phase(SessionPhase::Recording);
                let _ = self.event_tx.send(SessionEvent::RecordingStarted).await;
            }
            Err(e) => {
                log::error!("session: could not start recording: {e}");
            }
        }
    }

    /// End capture. On success the voice exchange is spawned; on failure no
    /// payload exists, so transcription is skipped and the phase collapses
    /// back to idle.
    async fn handle_stop(&mut self) {
        let payload = match self.recorder.stop() {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("session: could not finalise recording: {e}");
                let mut st = self.session.lock().unwrap();
                if st.phase == SessionPhase::Recording {
                    st.phase = SessionPhase::Idle;
                }
                return;
            }
        };

        log::debug!(
            "session: recording stopped ({:.1} s, {} bytes)",
            payload.duration_secs,
            payload.bytes.len()
        );
        self.set_phase(SessionPhase::AwaitingTranscript);
        let _ = self
            .event_tx
            .send(SessionEvent::RecordingStopped {
                duration_secs: payload.duration_secs,
            })
            .await;

        let session = Arc::clone(&self.session);
        let transcriber = Arc::clone(&self.transcriber);
        let responder = Arc::clone(&self.responder);
        let speaker = Arc::clone(&self.speaker);
        let language = self.language.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            run_voice_exchange(
                session,
                transcriber,
                responder,
                speaker,
                language,
                event_tx,
                payload,
            )
            .await;
        });
    }

    /// Manual text submission: store the input and run the reply half of the
    /// exchange, bypassing recording and transcription.
    async fn handle_submit(&mut self, text: String) {
        log::debug!("session: manual submit = {:?}", text);

        {
            let mut st = self.session.lock().unwrap();
            st.input_text = text.clone();
            st.phase = SessionPhase::AwaitingResponse;
        }

        let session = Arc::clone(&self.session);
        let responder = Arc::clone(&self.responder);
        let speaker = Arc::clone(&self.speaker);
        let language = self.language.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            run_reply_exchange(session, responder, speaker, language, event_tx, text).await;
        });
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_phase(&self, phase: SessionPhase) {
        let mut st = self.session.lock().unwrap();
        st.phase = phase;
    }
}

// ---------------------------------------------------------------------------
// Exchange tasks
// ---------------------------------------------------------------------------

/// Full voice exchange: transcribe the payload, store the transcript, then
/// run the reply exchange with it.
#[allow(clippy::too_many_arguments)]
async fn run_voice_exchange(
    session: SharedSession,
    transcriber: Arc<dyn Transcriber>,
    responder: Arc<dyn Responder>,
    speaker: Arc<dyn Speaker>,
    language: String,
    event_tx: mpsc::Sender<SessionEvent>,
    payload: crate::audio::AudioPayload,
) {
    let transcript = match transcriber.transcribe(payload).await {
        Ok(text) => text,
        Err(e) => {
            // Prior input text is retained; the responder is never invoked.
            log::error!("session: transcription failed: {e}");
            session.lock().unwrap().phase = SessionPhase::Idle;
            return;
        }
    };

    {
        let mut st = session.lock().unwrap();
        st.input_text = transcript.clone();
        st.phase = SessionPhase::AwaitingResponse;
    }
    let _ = event_tx
        .send(SessionEvent::TranscriptReady {
            text: transcript.clone(),
        })
        .await;

    run_reply_exchange(session, responder, speaker, language, event_tx, transcript).await;
}

/// Reply exchange: generate a reply for `prompt`, store it, and trigger
/// playback. Playback fires on every successful reply update — including a
/// reply identical to the previous one — and its failures are logged only.
async fn run_reply_exchange(
    session: SharedSession,
    responder: Arc<dyn Responder>,
    speaker: Arc<dyn Speaker>,
    language: String,
    event_tx: mpsc::Sender<SessionEvent>,
    prompt: String,
) {
    let reply = match responder.respond(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            // Reply text is left unchanged, so playback does not fire.
            log::error!("session: response generation failed: {e}");
            session.lock().unwrap().phase = SessionPhase::Idle;
            return;
        }
    };

    {
        let mut st = session.lock().unwrap();
        st.response_text = reply.clone();
        st.phase = SessionPhase::Idle;
    }
    let _ = event_tx
        .send(SessionEvent::ResponseReady { text: reply.clone() })
        .await;

    if let Err(e) = speaker.speak(&reply, &language) {
        log::error!("session: speech playback failed: {e}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::audio::{AudioPayload, MockRecorder};
    use crate::session::state::new_shared_session;
    use crate::speak::SpeakError;
    use crate::transcribe::TranscribeError;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Transcriber that succeeds with a fixed string and counts requests.
    struct OkTranscriber {
        text: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transcriber for OkTranscriber {
        async fn transcribe(&self, _payload: AudioPayload) -> Result<String, TranscribeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    /// Transcriber that always fails.
    struct FailTranscriber {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transcriber for FailTranscriber {
        async fn transcribe(&self, _payload: AudioPayload) -> Result<String, TranscribeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TranscribeError::Status {
                code: 502,
                body: "bad gateway".into(),
            })
        }
    }

    /// Responder that succeeds with a fixed string and counts requests.
    struct OkResponder {
        text: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Responder for OkResponder {
        async fn respond(&self, _prompt: &str) -> Result<String, crate::respond::RespondError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    /// Responder that always fails.
    struct FailResponder;

    #[async_trait]
    impl Responder for FailResponder {
        async fn respond(&self, _prompt: &str) -> Result<String, crate::respond::RespondError> {
            Err(crate::respond::RespondError::Timeout)
        }
    }

    /// Responder whose latency depends on the prompt: `"slow"` sleeps much
    /// longer than anything else, forcing out-of-order resolution.
    struct DelayedResponder;

    #[async_trait]
    impl Responder for DelayedResponder {
        async fn respond(&self, prompt: &str) -> Result<String, crate::respond::RespondError> {
            let delay = if prompt == "slow" { 150 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(format!("{prompt} reply"))
        }
    }

    /// Speaker that records every utterance it is handed.
    #[derive(Default)]
    struct RecordingSpeaker {
        utterances: Mutex<Vec<(String, String)>>,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, text: &str, language: &str) -> Result<(), SpeakError> {
            self.utterances
                .lock()
                .unwrap()
                .push((text.to_string(), language.to_string()));
            Ok(())
        }
    }

    /// Speaker whose engine is always broken.
    struct FailSpeaker;

    impl Speaker for FailSpeaker {
        fn speak(&self, _text: &str, _language: &str) -> Result<(), SpeakError> {
            Err(SpeakError::Spawn {
                program: "espeak-ng".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn one_second_payload() -> AudioPayload {
        AudioPayload {
            bytes: vec![0u8; 1024],
            mime: "audio/wav".into(),
            duration_secs: 1.0,
        }
    }

    struct Fixture {
        session: SharedSession,
        speaker: Arc<RecordingSpeaker>,
        transcribe_calls: Arc<AtomicUsize>,
        respond_calls: Arc<AtomicUsize>,
        command_tx: mpsc::Sender<SessionCommand>,
        event_rx: mpsc::Receiver<SessionEvent>,
        run_handle: tokio::task::JoinHandle<()>,
    }

    impl Fixture {
        fn start(
            recorder: Box<dyn Recorder>,
            transcriber: Arc<dyn Transcriber>,
            responder: Arc<dyn Responder>,
            speaker_impl: Option<Arc<dyn Speaker>>,
            transcribe_calls: Arc<AtomicUsize>,
            respond_calls: Arc<AtomicUsize>,
        ) -> Self {
            let session = new_shared_session();
            let recording_speaker = Arc::new(RecordingSpeaker::default());
            let speaker: Arc<dyn Speaker> = match speaker_impl {
                Some(s) => s,
                None => recording_speaker.clone(),
            };

            let (command_tx, command_rx) = mpsc::channel(8);
            let (event_tx, event_rx) = mpsc::channel(16);

            let orc = SessionOrchestrator::new(
                Arc::clone(&session),
                recorder,
                transcriber,
                responder,
                speaker,
                "en-US".into(),
                event_tx,
            );
            let run_handle = tokio::spawn(orc.run(command_rx));

            Self {
                session,
                speaker: recording_speaker,
                transcribe_calls,
                respond_calls,
                command_tx,
                event_rx,
                run_handle,
            }
        }

        /// Close the command channel, wait for the orchestrator, then drain
        /// events until every exchange task has dropped its sender.
        async fn finish(mut self) -> (SharedSession, Vec<SessionEvent>, Arc<RecordingSpeaker>) {
            drop(self.command_tx);
            self.run_handle.await.unwrap();

            let mut events = Vec::new();
            while let Some(event) = self.event_rx.recv().await {
                events.push(event);
            }
            (self.session, events, self.speaker)
        }
    }

    fn ok_stack(
        transcript: &str,
        reply: &str,
    ) -> (
        Arc<dyn Transcriber>,
        Arc<dyn Responder>,
        Arc<AtomicUsize>,
        Arc<AtomicUsize>,
    ) {
        let transcribe_calls = Arc::new(AtomicUsize::new(0));
        let respond_calls = Arc::new(AtomicUsize::new(0));
        let transcriber = Arc::new(OkTranscriber {
            text: transcript.into(),
            calls: Arc::clone(&transcribe_calls),
        });
        let responder = Arc::new(OkResponder {
            text: reply.into(),
            calls: Arc::clone(&respond_calls),
        });
        (transcriber, responder, transcribe_calls, respond_calls)
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    /// A full start + stop cycle issues exactly one transcription request and
    /// runs through to the stored reply and one playback.
    #[tokio::test]
    async fn full_voice_exchange_runs_to_completion() {
        let (transcriber, responder, t_calls, r_calls) = ok_stack("Hello", "Hi there");
        let fixture = Fixture::start(
            Box::new(MockRecorder::with_payload(one_second_payload())),
            transcriber,
            responder,
            None,
            t_calls,
            r_calls,
        );

        fixture
            .command_tx
            .send(SessionCommand::StartRecording)
            .await
            .unwrap();
        fixture
            .command_tx
            .send(SessionCommand::StopRecording)
            .await
            .unwrap();

        let t_calls = Arc::clone(&fixture.transcribe_calls);
        let r_calls = Arc::clone(&fixture.respond_calls);
        let (session, events, speaker) = fixture.finish().await;

        let st = session.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert_eq!(st.input_text, "Hello");
        assert_eq!(st.response_text, "Hi there");
        drop(st);

        assert_eq!(t_calls.load(Ordering::SeqCst), 1);
        assert_eq!(r_calls.load(Ordering::SeqCst), 1);

        assert!(events.contains(&SessionEvent::RecordingStarted));
        assert!(events.contains(&SessionEvent::TranscriptReady {
            text: "Hello".into()
        }));
        assert!(events.contains(&SessionEvent::ResponseReady {
            text: "Hi there".into()
        }));

        let utterances = speaker.utterances.lock().unwrap();
        assert_eq!(utterances.as_slice(), &[("Hi there".into(), "en-US".into())]);
    }

    /// Stop without a preceding start is a defined error: no payload, no
    /// transcription request, session untouched.
    #[tokio::test]
    async fn stop_without_start_submits_nothing() {
        let (transcriber, responder, t_calls, r_calls) = ok_stack("x", "y");
        let fixture = Fixture::start(
            Box::new(MockRecorder::with_payload(one_second_payload())),
            transcriber,
            responder,
            None,
            t_calls,
            r_calls,
        );

        fixture
            .command_tx
            .send(SessionCommand::StopRecording)
            .await
            .unwrap();

        let t_calls = Arc::clone(&fixture.transcribe_calls);
        let (session, events, _) = fixture.finish().await;

        assert_eq!(t_calls.load(Ordering::SeqCst), 0);
        assert!(events.is_empty());
        let st = session.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert!(st.input_text.is_empty());
        assert!(st.response_text.is_empty());
    }

    /// A start failure (device unavailable) leaves the recording flag false
    /// and the session idle.
    #[tokio::test]
    async fn start_failure_leaves_idle() {
        let (transcriber, responder, t_calls, r_calls) = ok_stack("x", "y");
        let fixture = Fixture::start(
            Box::new(MockRecorder::failing_device()),
            transcriber,
            responder,
            None,
            t_calls,
            r_calls,
        );

        fixture
            .command_tx
            .send(SessionCommand::StartRecording)
            .await
            .unwrap();

        let (session, events, _) = fixture.finish().await;

        let st = session.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert!(!st.recording());
        drop(st);
        assert!(!events.contains(&SessionEvent::RecordingStarted));
    }

    /// A stop failure (empty capture) produces no payload and returns the
    /// session to idle without invoking transcription.
    #[tokio::test]
    async fn stop_failure_skips_transcription() {
        let (transcriber, responder, t_calls, r_calls) = ok_stack("x", "y");
        let fixture = Fixture::start(
            Box::new(MockRecorder::failing_stop()),
            transcriber,
            responder,
            None,
            t_calls,
            r_calls,
        );

        fixture
            .command_tx
            .send(SessionCommand::StartRecording)
            .await
            .unwrap();
        fixture
            .command_tx
            .send(SessionCommand::StopRecording)
            .await
            .unwrap();

        let t_calls = Arc::clone(&fixture.transcribe_calls);
        let (session, _, _) = fixture.finish().await;

        assert_eq!(t_calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.lock().unwrap().phase, SessionPhase::Idle);
    }

    /// A failed transcription never invokes the responder and leaves both
    /// text fields unchanged.
    #[tokio::test]
    async fn transcription_failure_skips_responder() {
        let transcribe_calls = Arc::new(AtomicUsize::new(0));
        let respond_calls = Arc::new(AtomicUsize::new(0));
        let transcriber = Arc::new(FailTranscriber {
            calls: Arc::clone(&transcribe_calls),
        });
        let responder = Arc::new(OkResponder {
            text: "never".into(),
            calls: Arc::clone(&respond_calls),
        });

        let fixture = Fixture::start(
            Box::new(MockRecorder::with_payload(one_second_payload())),
            transcriber,
            responder,
            None,
            transcribe_calls,
            respond_calls,
        );

        fixture
            .command_tx
            .send(SessionCommand::StartRecording)
            .await
            .unwrap();
        fixture
            .command_tx
            .send(SessionCommand::StopRecording)
            .await
            .unwrap();

        let t_calls = Arc::clone(&fixture.transcribe_calls);
        let r_calls = Arc::clone(&fixture.respond_calls);
        let (session, _, speaker) = fixture.finish().await;

        assert_eq!(t_calls.load(Ordering::SeqCst), 1);
        assert_eq!(r_calls.load(Ordering::SeqCst), 0);

        let st = session.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert!(st.input_text.is_empty());
        assert!(st.response_text.is_empty());
        drop(st);

        assert!(speaker.utterances.lock().unwrap().is_empty());
    }

    /// A failed generation leaves the reply unchanged and triggers zero
    /// playback invocations.
    #[tokio::test]
    async fn respond_failure_triggers_no_playback() {
        let transcribe_calls = Arc::new(AtomicUsize::new(0));
        let respond_calls = Arc::new(AtomicUsize::new(0));
        let transcriber = Arc::new(OkTranscriber {
            text: "Hello".into(),
            calls: Arc::clone(&transcribe_calls),
        });

        let fixture = Fixture::start(
            Box::new(MockRecorder::with_payload(one_second_payload())),
            transcriber,
            Arc::new(FailResponder),
            None,
            transcribe_calls,
            respond_calls,
        );

        fixture
            .command_tx
            .send(SessionCommand::StartRecording)
            .await
            .unwrap();
        fixture
            .command_tx
            .send(SessionCommand::StopRecording)
            .await
            .unwrap();

        let (session, events, speaker) = fixture.finish().await;

        let st = session.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Idle);
        // Transcript landed, reply did not.
        assert_eq!(st.input_text, "Hello");
        assert!(st.response_text.is_empty());
        drop(st);

        assert!(speaker.utterances.lock().unwrap().is_empty());
        assert!(!events
            .iter()
            .any(|e| matches!(e, SessionEvent::ResponseReady { .. })));
    }

    /// Manual text submission bypasses the audio path: "Hello" in, stubbed
    /// "Hi there" out, exactly one playback of "Hi there".
    #[tokio::test]
    async fn manual_submit_bypasses_audio_path() {
        let (transcriber, responder, t_calls, r_calls) = ok_stack("unused", "Hi there");
        let fixture = Fixture::start(
            Box::new(MockRecorder::with_payload(one_second_payload())),
            transcriber,
            responder,
            None,
            t_calls,
            r_calls,
        );

        fixture
            .command_tx
            .send(SessionCommand::SubmitText("Hello".into()))
            .await
            .unwrap();

        let t_calls = Arc::clone(&fixture.transcribe_calls);
        let (session, events, speaker) = fixture.finish().await;

        assert_eq!(t_calls.load(Ordering::SeqCst), 0);

        let st = session.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert_eq!(st.input_text, "Hello");
        assert_eq!(st.response_text, "Hi there");
        drop(st);

        let utterances = speaker.utterances.lock().unwrap();
        assert_eq!(utterances.as_slice(), &[("Hi there".into(), "en-US".into())]);

        assert!(events.contains(&SessionEvent::ResponseReady {
            text: "Hi there".into()
        }));
    }

    /// An identical reply re-sent by the responder still triggers playback —
    /// the trigger is the update event, not text inequality.
    #[tokio::test]
    async fn repeated_identical_reply_replays() {
        let (transcriber, responder, t_calls, r_calls) = ok_stack("unused", "Same answer");
        let fixture = Fixture::start(
            Box::new(MockRecorder::with_payload(one_second_payload())),
            transcriber,
            responder,
            None,
            t_calls,
            r_calls,
        );

        fixture
            .command_tx
            .send(SessionCommand::SubmitText("first".into()))
            .await
            .unwrap();
        fixture
            .command_tx
            .send(SessionCommand::SubmitText("second".into()))
            .await
            .unwrap();

        let (_, _, speaker) = fixture.finish().await;

        let utterances = speaker.utterances.lock().unwrap();
        assert_eq!(utterances.len(), 2);
        assert!(utterances.iter().all(|(text, _)| text == "Same answer"));
    }

    /// A playback failure is logged only: the reply stays stored and the
    /// session returns to idle.
    #[tokio::test]
    async fn playback_failure_keeps_reply() {
        let (transcriber, responder, t_calls, r_calls) = ok_stack("unused", "Hi there");
        let fixture = Fixture::start(
            Box::new(MockRecorder::with_payload(one_second_payload())),
            transcriber,
            responder,
            Some(Arc::new(FailSpeaker)),
            t_calls,
            r_calls,
        );

        fixture
            .command_tx
            .send(SessionCommand::SubmitText("Hello".into()))
            .await
            .unwrap();

        let (session, events, _) = fixture.finish().await;

        let st = session.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert_eq!(st.response_text, "Hi there");
        drop(st);

        assert!(events.contains(&SessionEvent::ResponseReady {
            text: "Hi there".into()
        }));
    }

    /// Two overlapping generation requests resolving out of order leave the
    /// session holding the text of whichever resolved last. This pins the
    /// documented last-write-wins behaviour — there is no sequencing token.
    #[tokio::test]
    async fn overlapping_replies_last_write_wins() {
        let transcribe_calls = Arc::new(AtomicUsize::new(0));
        let respond_calls = Arc::new(AtomicUsize::new(0));
        let transcriber = Arc::new(OkTranscriber {
            text: "unused".into(),
            calls: Arc::clone(&transcribe_calls),
        });

        let fixture = Fixture::start(
            Box::new(MockRecorder::with_payload(one_second_payload())),
            transcriber,
            Arc::new(DelayedResponder),
            None,
            transcribe_calls,
            respond_calls,
        );

        // "slow" is submitted first but resolves last.
        fixture
            .command_tx
            .send(SessionCommand::SubmitText("slow".into()))
            .await
            .unwrap();
        fixture
            .command_tx
            .send(SessionCommand::SubmitText("fast".into()))
            .await
            .unwrap();

        let (session, events, speaker) = fixture.finish().await;

        // Both exchanges completed; the later resolver won the state write.
        assert_eq!(session.lock().unwrap().response_text, "slow reply");

        let ready: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::ResponseReady { text } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(ready, vec!["fast reply".to_string(), "slow reply".to_string()]);

        assert_eq!(speaker.utterances.lock().unwrap().len(), 2);
    }
}
