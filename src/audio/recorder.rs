//! Recorder controller — start/stop semantics over the shared capture buffer.
//!
//! [`Recorder`] is the capability trait the session orchestrator drives;
//! [`MicRecorder`] is the live implementation backed by a cpal tap (see
//! [`crate::audio::capture`]). A completed recording is finalised into an
//! [`AudioPayload`]: the captured samples encoded as a WAV byte buffer plus a
//! MIME tag, ready for a multipart upload.
//!
//! Invariants enforced here:
//! * `start()` is only valid while no recording is in progress — two
//!   recordings never overlap.
//! * `stop()` is only valid while a recording is in progress, and produces at
//!   most one payload per session — a second `stop()` cannot double-submit.

use std::io::Cursor;

use super::capture::{CaptureError, InputFormat, SharedCaptureBuffer};

// ---------------------------------------------------------------------------
// AudioPayload
// ---------------------------------------------------------------------------

/// One completed recording: encoded audio bytes plus their MIME type.
///
/// Produced once per `stop()`, handed to the transcription client, then
/// discarded.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    /// Encoded audio file bytes (WAV when produced by [`MicRecorder`]).
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, e.g. `"audio/wav"` or `"audio/mpeg"`.
    pub mime: String,
    /// Length of the recording in seconds.
    pub duration_secs: f32,
}

impl AudioPayload {
    /// File name to use for the multipart upload, derived from the MIME tag.
    pub fn file_name(&self) -> &'static str {
        match self.mime.as_str() {
            "audio/mpeg" => "speech.mp3",
            "audio/wav" => "speech.wav",
            _ => "speech.bin",
        }
    }
}

// ---------------------------------------------------------------------------
// Recorder trait
// ---------------------------------------------------------------------------

/// Capability trait for microphone recording.
///
/// Implementors must be `Send` so the session orchestrator can own one inside
/// a tokio task.
pub trait Recorder: Send {
    /// Begin a recording session.
    ///
    /// # Errors
    ///
    /// [`CaptureError::AlreadyRecording`] when a session is in progress, or a
    /// device error when the microphone is unavailable. On error the
    /// recording flag stays false.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// End the recording session and finalise it into an [`AudioPayload`].
    ///
    /// # Errors
    ///
    /// [`CaptureError::NotRecording`] when no session is in progress, or
    /// [`CaptureError::EmptyCapture`] when the session produced no samples.
    /// On error no payload is produced and the recording flag is false.
    fn stop(&mut self) -> Result<AudioPayload, CaptureError>;

    /// Whether a recording session is currently in progress.
    fn is_recording(&self) -> bool;
}

// ---------------------------------------------------------------------------
// MicRecorder
// ---------------------------------------------------------------------------

/// Live recorder over a [`SharedCaptureBuffer`] filled by a cpal tap.
///
/// `start()` clears the buffer and raises its `active` flag; `stop()` lowers
/// the flag, drains the accumulated samples and encodes them as 16-bit PCM
/// WAV at the device's native rate.
pub struct MicRecorder {
    buffer: SharedCaptureBuffer,
    format: InputFormat,
    recording: bool,
}

impl MicRecorder {
    /// Create a recorder over `buffer`, which must be fed by a
    /// [`Microphone::tap`](crate::audio::Microphone::tap) stream with the
    /// matching `format`.
    pub fn new(buffer: SharedCaptureBuffer, format: InputFormat) -> Self {
        Self {
            buffer,
            format,
            recording: false,
        }
    }
}

impl Recorder for MicRecorder {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.recording {
            return Err(CaptureError::AlreadyRecording);
        }

        {
            let mut buf = self.buffer.lock().unwrap();
            buf.samples.clear();
            buf.active = true;
        }

        self.recording = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioPayload, CaptureError> {
        if !self.recording {
            return Err(CaptureError::NotRecording);
        }
        self.recording = false;

        let samples: Vec<f32> = {
            let mut buf = self.buffer.lock().unwrap();
            buf.active = false;
            std::mem::take(&mut buf.samples)
        };

        if samples.is_empty() {
            return Err(CaptureError::EmptyCapture);
        }

        let duration_secs =
            samples.len() as f32 / (self.format.sample_rate as f32 * f32::from(self.format.channels));
        let bytes = encode_wav(&samples, self.format)?;

        Ok(AudioPayload {
            bytes,
            mime: "audio/wav".into(),
            duration_secs,
        })
    }

    fn is_recording(&self) -> bool {
        self.recording
    }
}

// ---------------------------------------------------------------------------
// WAV encoding
// ---------------------------------------------------------------------------

/// Encode interleaved `f32` samples as 16-bit PCM WAV at their native format.
fn encode_wav(samples: &[f32], format: InputFormat) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * f32::from(i16::MAX)) as i16)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// MockRecorder (test-only)
// ---------------------------------------------------------------------------

/// Scriptable recorder used by the session orchestrator tests.
#[cfg(test)]
pub struct MockRecorder {
    /// Payload returned by `stop()`; `None` makes `stop()` fail.
    payload: Option<AudioPayload>,
    /// When true, `start()` fails as if the device were unavailable.
    start_fails: bool,
    recording: bool,
}

#[cfg(test)]
impl MockRecorder {
    pub fn with_payload(payload: AudioPayload) -> Self {
        Self {
            payload: Some(payload),
            start_fails: false,
            recording: false,
        }
    }

    pub fn failing_device() -> Self {
        Self {
            payload: None,
            start_fails: true,
            recording: false,
        }
    }

    pub fn failing_stop() -> Self {
        Self {
            payload: None,
            start_fails: false,
            recording: false,
        }
    }
}

#[cfg(test)]
impl Recorder for MockRecorder {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.start_fails {
            return Err(CaptureError::NoDevice);
        }
        if self.recording {
            return Err(CaptureError::AlreadyRecording);
        }
        self.recording = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioPayload, CaptureError> {
        if !self.recording {
            return Err(CaptureError::NotRecording);
        }
        self.recording = false;
        match &self.payload {
            Some(payload) => Ok(payload.clone()),
            None => Err(CaptureError::EmptyCapture),
        }
    }

    fn is_recording(&self) -> bool {
        self.recording
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
