//! Microphone capture via `cpal`.
//!
//! [`Microphone`] wraps the cpal host/device/stream lifecycle. Call
//! [`Microphone::tap`] to stream interleaved `f32` samples into a
//! [`SharedCaptureBuffer`]; samples are only accumulated while the buffer's
//! `active` flag is set, so a single long-lived stream serves any number of
//! recording sessions. The returned [`StreamHandle`] is a RAII guard —
//! dropping it stops the underlying cpal stream and releases the device.
//!
//! cpal streams are not `Send`, which is why the stream stays on the thread
//! that created it and recording is gated through the shared buffer instead
//! of starting and stopping the hardware per session.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring the microphone or finalising a
/// recording.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// `start()` called while a recording is already in progress.
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// `stop()` called while no recording is in progress.
    #[error("no recording in progress")]
    NotRecording,

    /// The recording produced no samples, so there is nothing to transcribe.
    #[error("recording captured no audio")]
    EmptyCapture,

    /// WAV encoding of the captured samples failed.
    #[error("failed to encode captured audio: {0}")]
    Encode(#[from] hound::Error),
}

// ---------------------------------------------------------------------------
// CaptureBuffer
// ---------------------------------------------------------------------------

/// Sample accumulator shared between the cpal callback and the recorder.
///
/// The callback appends to `samples` only while `active` is `true`; the
/// recorder flips `active` and drains `samples` when a session ends.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    /// Interleaved PCM samples in `[-1.0, 1.0]` at the device's native rate.
    pub samples: Vec<f32>,
    /// Whether a recording session is currently accumulating samples.
    pub active: bool,
}

/// Thread-safe handle to a [`CaptureBuffer`].
pub type SharedCaptureBuffer = Arc<Mutex<CaptureBuffer>>;

/// Construct an empty, inactive [`SharedCaptureBuffer`].
pub fn new_capture_buffer() -> SharedCaptureBuffer {
    Arc::new(Mutex::new(CaptureBuffer::default()))
}

// ---------------------------------------------------------------------------
// InputFormat
// ---------------------------------------------------------------------------

/// Native format of the capture stream, needed to encode the samples later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    /// Sample rate in Hz (commonly 44 100 or 48 000).
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono, 2 = stereo, …).
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the underlying hardware stream and releases the
/// input device.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// Microphone
// ---------------------------------------------------------------------------

/// System default microphone wrapped for tap-style capture.
///
/// # Example
///
/// ```rust,no_run
/// use talkmatic::audio::{new_capture_buffer, Microphone};
///
/// let mic = Microphone::open().unwrap();
/// let buffer = new_capture_buffer();
/// let _handle = mic.tap(buffer.clone()).unwrap();
/// // Samples flow into `buffer` whenever `buffer.active` is true.
/// ```
pub struct Microphone {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: InputFormat,
}

impl Microphone {
    /// Open the system default input device with its preferred configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoDevice`] when no input device is available,
    /// or [`CaptureError::DefaultConfig`] when the device cannot report a
    /// default stream configuration.
    pub fn open() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
        let format = InputFormat {
            sample_rate: supported.sample_rate().0,
            channels: supported.channels(),
        };

        Ok(Self {
            device,
            config: supported.into(),
            format,
        })
    }

    /// Native format of the capture stream.
    pub fn format(&self) -> InputFormat {
        self.format
    }

    /// Start streaming samples into `sink`.
    ///
    /// The cpal callback runs on a dedicated audio thread; it appends each
    /// hardware buffer to `sink` while the sink's `active` flag is set and
    /// discards it otherwise. A poisoned sink lock is silently skipped so the
    /// audio thread never panics.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the stream configuration.
    pub fn tap(&self, sink: SharedCaptureBuffer) -> Result<StreamHandle, CaptureError> {
        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = sink.lock() {
                    if buf.active {
                        buf.samples.extend_from_slice(data);
                    }
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
