use std::time::Duration;

use mouledi_types::DEFAULT_RESULT_LIMIT;
use serde::{Deserialize, Serialize};

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_stt_base_url() -> String {
    "http://127.0.0.1:8001".to_string()
}

fn default_health_timeout_ms() -> u64 {
    8000
}

fn default_search_timeout_ms() -> u64 {
    9000
}

fn default_transcription_timeout_ms() -> u64 {
    15000
}

fn default_feedback_timeout_ms() -> u64 {
    9000
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_result_limit() -> u32 {
    DEFAULT_RESULT_LIMIT
}

fn default_min_recording_ms() -> u64 {
    900
}

fn default_min_transcript_chars() -> usize {
    2
}

fn default_location_timeout_ms() -> u64 {
    8000
}

fn default_location_max_age_ms() -> u64 {
    15000
}

fn default_language() -> String {
    "mina".to_string()
}

/// Endpoints and per-request budgets of the remote backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Search backend: health, provider search, feedback audio.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Transcription backend.
    #[serde(default = "default_stt_base_url")]
    pub stt_base_url: String,
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
    #[serde(default = "default_transcription_timeout_ms")]
    pub transcription_timeout_ms: u64,
    #[serde(default = "default_feedback_timeout_ms")]
    pub feedback_timeout_ms: u64,
    /// Largest recording sent for transcription; bigger ones are rejected locally.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Maximum number of providers requested per search.
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            stt_base_url: default_stt_base_url(),
            health_timeout_ms: default_health_timeout_ms(),
            search_timeout_ms: default_search_timeout_ms(),
            transcription_timeout_ms: default_transcription_timeout_ms(),
            feedback_timeout_ms: default_feedback_timeout_ms(),
            max_upload_bytes: default_max_upload_bytes(),
            result_limit: default_result_limit(),
        }
    }
}

impl ServiceConfig {
    pub fn new(api_base_url: impl Into<String>, stt_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            stt_base_url: stt_base_url.into(),
            ..Self::default()
        }
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn transcription_timeout(&self) -> Duration {
        Duration::from_millis(self.transcription_timeout_ms)
    }

    pub fn feedback_timeout(&self) -> Duration {
        Duration::from_millis(self.feedback_timeout_ms)
    }
}

/// Thresholds of one voice session.
///
/// Network budgets live in [`ServiceConfig`]; the controller reads them from there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Recordings shorter than this are treated as accidental taps.
    #[serde(default = "default_min_recording_ms")]
    pub min_recording_ms: u64,
    /// Transcripts with fewer trimmed characters are treated as noise.
    #[serde(default = "default_min_transcript_chars")]
    pub min_transcript_chars: usize,
    #[serde(default = "default_location_timeout_ms")]
    pub location_timeout_ms: u64,
    /// A position fix younger than this is reused instead of re-acquired.
    #[serde(default = "default_location_max_age_ms")]
    pub location_max_age_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_recording_ms: default_min_recording_ms(),
            min_transcript_chars: default_min_transcript_chars(),
            location_timeout_ms: default_location_timeout_ms(),
            location_max_age_ms: default_location_max_age_ms(),
        }
    }
}

impl SessionConfig {
    pub fn min_recording(&self) -> Duration {
        Duration::from_millis(self.min_recording_ms)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }

    pub fn location_max_age(&self) -> Duration {
        Duration::from_millis(self.location_max_age_ms)
    }
}

/// Feedback prompt settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Language code sent with every prompt key.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}
