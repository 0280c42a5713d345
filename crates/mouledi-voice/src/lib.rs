//! Voice pipeline for the mouledi assistant.
//!
//! Drives one press-to-talk session from microphone capture through
//! backend warm-up, remote transcription, routing and location, and narrates
//! each step with short spoken prompts. Platform concerns (microphone,
//! speaker, position) and remote services are traits, so the same
//! [`VoiceSessionController`] runs against real backends over HTTP
//! ([`HttpBackend`]) or against in-process fakes.
//!
//! Feedback prompts go through a single [`FeedbackPlayer`] per screen, which
//! guarantees that prompts never overlap and that a superseded prompt never
//! becomes audible.

pub mod capture;
pub mod config;
pub mod error;
pub mod feedback;
pub mod http;
pub mod location;
pub mod playback;
pub mod results;
pub mod services;
pub mod session;

pub use capture::{ActiveCapture, AudioCapture, AudioFormat, CapturedAudio, WavFileCapture};
pub use config::{FeedbackConfig, ServiceConfig, SessionConfig};
pub use error::{AudioError, CaptureError, ServiceError, SessionError};
pub use feedback::FeedbackPlayer;
pub use http::HttpBackend;
pub use location::{CachedGeolocator, FixedGeolocator, Geolocator};
pub use playback::{AudioOutput, LoggingOutput, PlaybackHandle};
pub use results::{ResultsAction, ResultsLoader, ResultsPage};
pub use services::{HealthProbe, PromptResolver, ProviderSearch, Transcriber, Transcription};
pub use session::{
    Collaborators, DispatchRequest, FallbackReason, PressOutcome, ProcessingStage,
    SessionEvent, SessionOutcome, SessionPhase, VoiceSessionController,
};
