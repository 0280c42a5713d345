//! HTTP implementations of the remote collaborators.

use std::time::Duration;

use async_trait::async_trait;
use mouledi_types::{Backend, PromptKey, ProviderQuery, ProviderRecord};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::capture::CapturedAudio;
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::services::{HealthProbe, PromptResolver, ProviderSearch, Transcriber, Transcription};

/// Error bodies are truncated to this many characters before being kept.
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Deserialize)]
struct PromptAudioResponse {
    #[serde(default)]
    url: String,
}

/// Talks to the search backend and the transcription backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: ServiceConfig,
}

impl HttpBackend {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_client(build_http_client(), config)
    }

    pub fn with_client(client: Client, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    fn base_url(&self, backend: Backend) -> &str {
        match backend {
            Backend::Search => &self.config.api_base_url,
            Backend::Transcription => &self.config.stt_base_url,
        }
    }

    fn endpoint<I, K, V>(&self, backend: Backend, path: &str, params: I) -> Result<Url, ServiceError>
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let raw = self.raw_endpoint(backend, path);
        Url::parse_with_params(&raw, params).map_err(|e| ServiceError::InvalidUrl(format!("{raw}: {e}")))
    }

    fn plain_endpoint(&self, backend: Backend, path: &str) -> Result<Url, ServiceError> {
        let raw = self.raw_endpoint(backend, path);
        Url::parse(&raw).map_err(|e| ServiceError::InvalidUrl(format!("{raw}: {e}")))
    }

    fn raw_endpoint(&self, backend: Backend, path: &str) -> String {
        format!("{}{}", self.base_url(backend).trim_end_matches('/'), path)
    }
}

fn build_http_client() -> Client {
    Client::builder()
        .user_agent(concat!("mouledi/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

fn map_send_error(operation: &'static str, after: Duration, err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout { operation, after }
    } else {
        ServiceError::Network {
            operation,
            source: err,
        }
    }
}

/// Turns a non-2xx response into `ServiceError::Http`, keeping a bounded body.
async fn check_status(operation: &'static str, resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    debug!(operation, status = status.as_u16(), "upstream returned error");
    Err(ServiceError::Http {
        operation,
        status: status.as_u16(),
        body,
    })
}

async fn read_json(
    operation: &'static str,
    after: Duration,
    resp: Response,
) -> Result<serde_json::Value, ServiceError> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| map_send_error(operation, after, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode {
        operation,
        detail: e.to_string(),
    })
}

#[async_trait]
impl HealthProbe for HttpBackend {
    async fn is_available(&self, backend: Backend) -> bool {
        let url = match self.plain_endpoint(backend, "/health") {
            Ok(url) => url,
            Err(e) => {
                warn!(backend = %backend, error = %e, "health URL invalid");
                return false;
            }
        };

        let result = self
            .client
            .get(url)
            .timeout(self.config.health_timeout())
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                debug!(backend = %backend, status = resp.status().as_u16(), "health check failed");
                false
            }
            Err(e) => {
                debug!(backend = %backend, error = %e, "health check unreachable");
                false
            }
        }
    }
}

#[async_trait]
impl ProviderSearch for HttpBackend {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<ProviderRecord>, ServiceError> {
        const OPERATION: &str = "provider search";

        let mut params: Vec<(&str, String)> = vec![
            ("type", query.kind.as_str().to_string()),
            ("limit", query.limit.to_string()),
        ];
        if query.on_call_now {
            params.push(("on_call_now", "true".to_string()));
        }
        if let Some(near) = query.near {
            params.push(("near_lat", near.latitude.to_string()));
            params.push(("near_lng", near.longitude.to_string()));
        }
        if let Some(district) = query.district {
            params.push(("district", district.as_str().to_string()));
        }

        let url = self.endpoint(Backend::Search, "/health/providers", &params)?;
        let timeout = self.config.search_timeout();
        debug!(url = %url, "searching providers");

        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(OPERATION, timeout, e))?;
        let resp = check_status(OPERATION, resp).await?;
        let body = read_json(OPERATION, timeout, resp).await?;

        let items = match body.get("items") {
            Some(serde_json::Value::Array(items)) => items.clone(),
            _ => return Ok(Vec::new()),
        };

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<ProviderRecord>(item) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping malformed provider record"),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl PromptResolver for HttpBackend {
    async fn resolve(&self, key: PromptKey, language: &str) -> Result<String, ServiceError> {
        const OPERATION: &str = "feedback audio";

        let base = self.plain_endpoint(Backend::Search, "/")?;
        let url = self.endpoint(
            Backend::Search,
            "/health/ui-audio",
            [("key", key.as_str()), ("lang", language)],
        )?;
        let timeout = self.config.feedback_timeout();

        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(OPERATION, timeout, e))?;
        if !resp.status().is_success() {
            return Err(ServiceError::NotFound(format!(
                "{key} ({language}): HTTP {}",
                resp.status().as_u16()
            )));
        }

        let body = read_json(OPERATION, timeout, resp).await?;
        let parsed: PromptAudioResponse =
            serde_json::from_value(body).map_err(|e| ServiceError::Decode {
                operation: OPERATION,
                detail: e.to_string(),
            })?;
        if parsed.url.trim().is_empty() {
            return Err(ServiceError::NotFound(format!("{key} ({language}): empty url")));
        }

        // Relative URLs are served by the search backend itself.
        base.join(parsed.url.trim())
            .map(String::from)
            .map_err(|e| ServiceError::InvalidUrl(format!("{}: {e}", parsed.url)))
    }
}

#[async_trait]
impl Transcriber for HttpBackend {
    async fn transcribe(&self, audio: &CapturedAudio) -> Result<Transcription, ServiceError> {
        const OPERATION: &str = "transcription";

        let limit = self.config.max_upload_bytes;
        if audio.bytes.len() > limit {
            return Err(ServiceError::PayloadTooLarge {
                size: audio.bytes.len(),
                limit,
            });
        }

        let part = reqwest::multipart::Part::bytes(audio.bytes.clone())
            .file_name(audio.format.file_name)
            .mime_str(audio.format.mime_type)
            .map_err(|e| ServiceError::Decode {
                operation: OPERATION,
                detail: format!("invalid mime type {}: {e}", audio.format.mime_type),
            })?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let url = self.plain_endpoint(Backend::Transcription, "/stt")?;
        let timeout = self.config.transcription_timeout();
        debug!(url = %url, bytes = audio.bytes.len(), "uploading recording");

        let resp = self
            .client
            .post(url)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(OPERATION, timeout, e))?;
        let resp = check_status(OPERATION, resp).await?;
        let body = read_json(OPERATION, timeout, resp).await?;

        serde_json::from_value(body).map_err(|e| ServiceError::Decode {
            operation: OPERATION,
            detail: e.to_string(),
        })
    }
}
