//! Application entry point — Talkmatic.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the HTTP clients and the speaker from config.
//! 5. Open the microphone and tap it into the shared capture buffer; the
//!    cpal stream handle stays on the main thread (cpal streams are not
//!    `Send`).
//! 6. Spawn the session orchestrator and the event printer on the runtime.
//! 7. Run the stdin command loop — blocks the main thread until `quit`.

use std::io::BufRead;
use std::sync::Arc;

use tokio::sync::mpsc;

use talkmatic::{
    audio::{
        new_capture_buffer, AudioPayload, CaptureError, MicRecorder, Microphone, Recorder,
        StreamHandle,
    },
    config::AppConfig,
    respond::{HttpResponder, Responder},
    session::{new_shared_session, SessionCommand, SessionEvent, SessionOrchestrator},
    speak::{CommandSpeaker, Speaker},
    transcribe::{HttpTranscriber, Transcriber},
};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Talkmatic starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 workers — one exchange in flight plus the printer)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    // 4. Capabilities from config
    let transcriber: Arc<dyn Transcriber> =
        Arc::new(HttpTranscriber::from_config(&config.transcription));
    let responder: Arc<dyn Responder> = Arc::new(HttpResponder::from_config(&config.response));
    let speaker: Arc<dyn Speaker> = Arc::new(CommandSpeaker::new(config.speech.program.clone()));

    // 5. Microphone — degrade gracefully when no input device exists so the
    //    typed-text path still works.
    let buffer = new_capture_buffer();
    let (recorder, _stream_handle): (Box<dyn Recorder>, Option<StreamHandle>) =
        match Microphone::open() {
            Ok(mic) => match mic.tap(buffer.clone()) {
                Ok(handle) => {
                    let format = mic.format();
                    log::info!(
                        "Microphone ready ({} Hz, {} ch)",
                        format.sample_rate,
                        format.channels
                    );
                    (Box::new(MicRecorder::new(buffer, format)), Some(handle))
                }
                Err(e) => {
                    log::warn!("Failed to start audio stream: {e}");
                    (Box::new(NoDeviceRecorder), None)
                }
            },
            Err(e) => {
                log::warn!("Microphone unavailable: {e}");
                (Box::new(NoDeviceRecorder), None)
            }
        };

    // 6. Channels, session state, orchestrator, event printer
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(32);

    let session = new_shared_session();
    let orchestrator = SessionOrchestrator::new(
        Arc::clone(&session),
        recorder,
        transcriber,
        responder,
        speaker,
        config.speech.language.clone(),
        event_tx,
    );
    rt.spawn(orchestrator.run(command_rx));

    rt.spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                SessionEvent::RecordingStarted => {
                    println!("recording — type `stop` to finish");
                }
                SessionEvent::RecordingStopped { duration_secs } => {
                    println!("recorded {duration_secs:.1} s, transcribing…");
                }
                SessionEvent::TranscriptReady { text } => {
                    println!("you said: {text}");
                }
                SessionEvent::ResponseReady { text } => {
                    println!("reply: {text}");
                }
            }
        }
    });

    // 7. stdin command loop (blocks until quit / EOF)
    println!("commands: record | stop | status | quit — anything else is sent as a prompt");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();

        let command = match line {
            "" => continue,
            "quit" | "exit" => break,
            "status" => {
                let st = session.lock().unwrap();
                println!(
                    "{} | input: {:?} | reply: {:?}",
                    st.phase.label(),
                    st.input_text,
                    st.response_text
                );
                continue;
            }
            "record" => SessionCommand::StartRecording,
            "stop" => SessionCommand::StopRecording,
            text => SessionCommand::SubmitText(text.to_string()),
        };

        if rt.block_on(command_tx.send(command)).is_err() {
            break;
        }
    }

    drop(command_tx);
    log::info!("Talkmatic shutting down");
    Ok(())
}

// ---------------------------------------------------------------------------
// NoDeviceRecorder — fallback Recorder when no microphone is present
// ---------------------------------------------------------------------------

struct NoDeviceRecorder;

impl Recorder for NoDeviceRecorder {
    fn start(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::NoDevice)
    }

    fn stop(&mut self) -> Result<AudioPayload, CaptureError> {
        Err(CaptureError::NotRecording)
    }

    fn is_recording(&self) -> bool {
        false
    }
}
