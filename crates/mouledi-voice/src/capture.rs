//! Microphone capture seam and a file-backed implementation for hosts
//! without a live microphone.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::CaptureError;

/// Container format of a captured clip, as uploaded to transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Filename sent in the multipart upload.
    pub file_name: &'static str,
    /// MIME type of the upload part.
    pub mime_type: &'static str,
}

impl AudioFormat {
    /// AAC in MP4, produced by mobile recorders.
    pub const M4A: Self = Self {
        file_name: "speech.m4a",
        mime_type: "audio/m4a",
    };
    /// Opus in WebM, produced by browser recorders.
    pub const WEBM: Self = Self {
        file_name: "speech.webm",
        mime_type: "audio/webm",
    };
    pub const WAV: Self = Self {
        file_name: "speech.wav",
        mime_type: "audio/wav",
    };
}

/// A finished recording.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub bytes: Vec<u8>,
    pub duration: Duration,
    pub format: AudioFormat,
}

/// The platform microphone.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Asks the user for microphone access. `Ok(false)` means refused.
    async fn request_permission(&self) -> Result<bool, CaptureError>;

    /// Switches the platform audio session between recording and playback.
    async fn set_recording_mode(&self, recording: bool) -> Result<(), CaptureError>;

    /// Starts a recording. The returned handle owns the device until stopped.
    async fn start(&self) -> Result<Box<dyn ActiveCapture>, CaptureError>;
}

/// An in-progress recording.
#[async_trait]
pub trait ActiveCapture: Send + Sync {
    /// Stops recording and returns the clip. Releases the device either way.
    async fn stop(self: Box<Self>) -> Result<CapturedAudio, CaptureError>;

    /// Stops recording and drops whatever was captured.
    async fn discard(self: Box<Self>);
}

/// Replays a WAV file as if it had just been recorded.
#[derive(Debug, Clone)]
pub struct WavFileCapture {
    path: PathBuf,
}

impl WavFileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AudioCapture for WavFileCapture {
    async fn request_permission(&self) -> Result<bool, CaptureError> {
        Ok(true)
    }

    async fn set_recording_mode(&self, recording: bool) -> Result<(), CaptureError> {
        debug!(recording, "audio mode switch (no-op for file capture)");
        Ok(())
    }

    async fn start(&self) -> Result<Box<dyn ActiveCapture>, CaptureError> {
        Ok(Box::new(WavFileRecording {
            path: self.path.clone(),
        }))
    }
}

struct WavFileRecording {
    path: PathBuf,
}

#[async_trait]
impl ActiveCapture for WavFileRecording {
    async fn stop(self: Box<Self>) -> Result<CapturedAudio, CaptureError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let reader = hound::WavReader::new(std::io::Cursor::new(&bytes))?;
        let spec = reader.spec();
        let frames = reader.duration();
        if spec.sample_rate == 0 {
            return Err(CaptureError::Unsupported(format!(
                "{}: sample rate is zero",
                self.path.display()
            )));
        }
        let duration = Duration::from_secs_f64(f64::from(frames) / f64::from(spec.sample_rate));

        info!(
            path = %self.path.display(),
            bytes = bytes.len(),
            duration_ms = duration.as_millis() as u64,
            "loaded recording from file"
        );

        Ok(CapturedAudio {
            bytes,
            duration,
            format: AudioFormat::WAV,
        })
    }

    async fn discard(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &std::path::Path, sample_rate: u32, samples: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..samples {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[tokio::test]
    async fn wav_duration_comes_from_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav(&path, 16_000, 24_000);

        let capture = WavFileCapture::new(&path);
        assert!(capture.request_permission().await.unwrap());
        let audio = capture.start().await.unwrap().stop().await.unwrap();

        assert_eq!(audio.duration, Duration::from_millis(1500));
        assert_eq!(audio.format, AudioFormat::WAV);
        assert!(audio.bytes.starts_with(b"RIFF"));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let capture = WavFileCapture::new("/nonexistent/clip.wav");
        let err = capture.start().await.unwrap().stop().await.unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
    }

    #[tokio::test]
    async fn non_wav_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"not a wav file").unwrap();

        let err = WavFileCapture::new(&path)
            .start()
            .await
            .unwrap()
            .stop()
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Wav(_)));
    }
}
