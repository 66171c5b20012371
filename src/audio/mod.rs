//! Audio capture — microphone tap → shared buffer → WAV payload.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → SharedCaptureBuffer (gated by `active`)
//!           → MicRecorder::stop() → AudioPayload (WAV bytes + MIME tag)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use talkmatic::audio::{new_capture_buffer, MicRecorder, Microphone, Recorder};
//!
//! let mic = Microphone::open().unwrap();
//! let buffer = new_capture_buffer();
//! let _handle = mic.tap(buffer.clone()).unwrap(); // drop handle → stop stream
//!
//! let mut recorder = MicRecorder::new(buffer, mic.format());
//! recorder.start().unwrap();
//! // ... user speaks ...
//! let payload = recorder.stop().unwrap();
//! println!("{} bytes of {}", payload.bytes.len(), payload.mime);
//! ```

pub mod capture;
pub mod recorder;

pub use capture::{
    new_capture_buffer, CaptureBuffer, CaptureError, InputFormat, Microphone,
    SharedCaptureBuffer, StreamHandle,
};
pub use recorder::{AudioPayload, MicRecorder, Recorder};

// test-only re-export so the session test module can import MockRecorder
// without `use talkmatic::audio::recorder::MockRecorder`.
#[cfg(test)]
pub use recorder::MockRecorder;
