use std::time::Duration;

use mouledi_types::Backend;
use thiserror::Error;

/// Failures of a remote collaborator (search, transcription, feedback audio).
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{operation} returned HTTP {status}: {body}")]
    Http {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} request failed: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} timed out after {} ms", after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid {operation} response: {detail}")]
    Decode {
        operation: &'static str,
        detail: String,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("payload exceeds maximum size: {size} bytes (limit: {limit} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Failures of the platform microphone.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("capture device error: {0}")]
    Device(String),

    #[error("unsupported audio input: {0}")]
    Unsupported(String),

    /// The recording is larger than the transcription backend accepts.
    #[error("recording too large: {size} bytes (limit: {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("audio file error: {0}")]
    Wav(#[from] hound::Error),

    #[error("audio file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the platform audio output.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("playback error: {0}")]
    Playback(String),
}

/// Why a voice session ended in `Failed` or in a repeat-prompt `Fallback`.
///
/// Caught at the session boundary, turned into a short status line and a
/// spoken "please repeat"; never surfaced to the host as an error.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("{0} backend unavailable")]
    BackendUnavailable(Backend),

    #[error("transcription failed: {detail}")]
    TranscriptionFailed { status: Option<u16>, detail: String },

    #[error("no speech detected")]
    NoSpeechDetected,

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("capture failed: {0}")]
    Capture(CaptureError),
}

impl SessionError {
    /// Status line shown to the user.
    pub fn user_status(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Permission micro refusée.",
            Self::BackendUnavailable(Backend::Search) => "Backend indisponible",
            Self::BackendUnavailable(Backend::Transcription) => "Assistance vocale indisponible",
            Self::TranscriptionFailed {
                status: Some(_), ..
            } => "Erreur de reconnaissance vocale (STT)",
            Self::TranscriptionFailed { status: None, .. } => "Problème de connexion / serveur",
            Self::NoSpeechDetected => "Répétez",
            Self::Timeout { .. } => "Le serveur met trop de temps (timeout)",
            Self::Capture(CaptureError::PermissionDenied) => "Autorisation micro refusée",
            Self::Capture(CaptureError::TooLarge { .. }) => "Enregistrement trop long",
            Self::Capture(_) => "Erreur pendant l'enregistrement",
        }
    }
}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied => Self::PermissionDenied,
            other => Self::Capture(other),
        }
    }
}

impl From<ServiceError> for SessionError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Timeout { operation, .. } => Self::Timeout { operation },
            ServiceError::PayloadTooLarge { size, limit } => {
                Self::Capture(CaptureError::TooLarge { size, limit })
            }
            ServiceError::Http { status, body, .. } => Self::TranscriptionFailed {
                status: Some(status),
                detail: body,
            },
            other => Self::TranscriptionFailed {
                status: None,
                detail: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_statuses_are_distinct() {
        assert_eq!(
            SessionError::BackendUnavailable(Backend::Search).user_status(),
            "Backend indisponible"
        );
        assert_eq!(
            SessionError::BackendUnavailable(Backend::Transcription).user_status(),
            "Assistance vocale indisponible"
        );
    }

    #[test]
    fn service_errors_map_to_session_taxonomy() {
        let err: SessionError = ServiceError::Timeout {
            operation: "transcription",
            after: Duration::from_secs(15),
        }
        .into();
        assert!(matches!(err, SessionError::Timeout { operation: "transcription" }));

        let err: SessionError = ServiceError::Http {
            operation: "transcription",
            status: 502,
            body: "bad gateway".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            SessionError::TranscriptionFailed {
                status: Some(502),
                ..
            }
        ));
        assert_eq!(err.user_status(), "Erreur de reconnaissance vocale (STT)");

        let err: SessionError = ServiceError::Decode {
            operation: "transcription",
            detail: "missing text".to_string(),
        }
        .into();
        assert_eq!(err.user_status(), "Problème de connexion / serveur");

        let err: SessionError = ServiceError::PayloadTooLarge {
            size: 30_000_000,
            limit: 26_214_400,
        }
        .into();
        assert!(matches!(
            err,
            SessionError::Capture(CaptureError::TooLarge { .. })
        ));
        assert_eq!(err.user_status(), "Enregistrement trop long");
    }

    #[test]
    fn capture_permission_becomes_permission_denied() {
        let err: SessionError = CaptureError::PermissionDenied.into();
        assert!(matches!(err, SessionError::PermissionDenied));

        let err: SessionError = CaptureError::Device("busy".to_string()).into();
        assert_eq!(err.user_status(), "Erreur pendant l'enregistrement");
    }
}
