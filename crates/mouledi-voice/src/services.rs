//! Remote collaborators of the voice pipeline.
//!
//! Each trait is one concern of the backend so that tests and alternative
//! hosts can substitute them independently. [`crate::http::HttpBackend`]
//! implements all four over HTTP.

use async_trait::async_trait;
use mouledi_types::{Backend, PromptKey, ProviderQuery, ProviderRecord};
use serde::Deserialize;

use crate::capture::CapturedAudio;
use crate::error::ServiceError;

/// Text returned by the transcription backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transcription {
    pub text: String,
    /// Server-side processing time, when reported.
    #[serde(default)]
    pub elapsed_s: Option<f64>,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &CapturedAudio) -> Result<Transcription, ServiceError>;
}

#[async_trait]
pub trait ProviderSearch: Send + Sync {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<ProviderRecord>, ServiceError>;
}

/// Maps a prompt key and language to a playable audio URL.
#[async_trait]
pub trait PromptResolver: Send + Sync {
    async fn resolve(&self, key: PromptKey, language: &str) -> Result<String, ServiceError>;
}

/// Liveness probe. Never fails: any error counts as unavailable.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn is_available(&self, backend: Backend) -> bool;
}
