//! The press-to-talk session state machine.
//!
//! One controller drives one screen. A press either opens a recording or
//! closes the open one and runs it through warm-up, transcription and
//! routing; presses that arrive while a session is being processed are
//! ignored. Every session ends in `Dispatched`, `Fallback` or `Failed`, and
//! every failure is turned into a status line plus a spoken "please repeat"
//! rather than an error for the host.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use mouledi_nlu::QueryRouter;
use mouledi_types::{Backend, Coordinates, District, Intent, PromptKey, RoutingResult};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::capture::{ActiveCapture, AudioCapture, CapturedAudio};
use crate::config::{ServiceConfig, SessionConfig};
use crate::error::SessionError;
use crate::feedback::FeedbackPlayer;
use crate::location::{CachedGeolocator, Geolocator};
use crate::services::{HealthProbe, Transcriber};

/// Capacity of the session event channel.
const SESSION_EVENT_CAPACITY: usize = 64;

const STATUS_LISTENING: &str = "J'écoute...";
const STATUS_PROCESSING: &str = "Traitement...";
const STATUS_WARMING_UP: &str = "Réveil serveur…";
const STATUS_TRANSCRIBING: &str = "Reconnaissance…";
const STATUS_LOCATING: &str = "Localisation…";

/// Transcript used by "browse pharmacies" when nothing was heard yet.
const DEFAULT_BROWSE_TRANSCRIPT: &str = "pharmacie";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Warmup,
    Transcribing,
    Locating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Recording,
    Processing(ProcessingStage),
    Dispatched,
    Fallback,
    Failed,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Processing(ProcessingStage::Warmup) => "processing:warmup",
            Self::Processing(ProcessingStage::Transcribing) => "processing:transcribing",
            Self::Processing(ProcessingStage::Locating) => "processing:locating",
            Self::Dispatched => "dispatched",
            Self::Fallback => "fallback",
            Self::Failed => "failed",
        }
    }

    pub fn is_processing(self) -> bool {
        matches!(self, Self::Processing(_))
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the host needs to open the results view.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub transcript: String,
    pub intent: Intent,
    pub district: Option<District>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The recording was shorter than the minimum duration.
    TooShort,
    /// The transcript was empty or too short to be speech.
    NoSpeech,
    /// The transcript was understood but matched no intent.
    UnknownIntent,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    Dispatched(DispatchRequest),
    Fallback {
        reason: FallbackReason,
        last_heard: Option<String>,
    },
    Failed(SessionError),
}

impl SessionOutcome {
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Dispatched(_) => SessionPhase::Dispatched,
            Self::Fallback { .. } => SessionPhase::Fallback,
            Self::Failed(_) => SessionPhase::Failed,
        }
    }
}

/// Result of one press of the microphone button.
#[derive(Debug)]
pub enum PressOutcome {
    /// A session is being processed; the press did nothing.
    Ignored,
    RecordingStarted,
    Finished(SessionOutcome),
}

/// Notifications for the host view.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged(SessionPhase),
    NavigateToResults(DispatchRequest),
    ShowFallback { last_heard: Option<String> },
}

/// The controller's collaborators.
pub struct Collaborators {
    pub capture: Arc<dyn AudioCapture>,
    pub transcriber: Arc<dyn Transcriber>,
    pub health: Arc<dyn HealthProbe>,
    pub geolocator: Arc<dyn Geolocator>,
}

struct RecordingSession {
    id: Uuid,
    started_at: Instant,
    handle: Box<dyn ActiveCapture>,
    span: Span,
}

struct SessionState {
    phase: SessionPhase,
    busy: bool,
    recording: Option<RecordingSession>,
    status: String,
    last_heard: Option<String>,
}

/// Clears the busy flag when a press or submission returns.
struct BusyGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.busy = false;
        // Only reachable when the host drops a session future mid-flight.
        if state.phase.is_processing() {
            state.phase = SessionPhase::Idle;
        }
    }
}

pub struct VoiceSessionController {
    capture: Arc<dyn AudioCapture>,
    transcriber: Arc<dyn Transcriber>,
    health: Arc<dyn HealthProbe>,
    geolocator: CachedGeolocator,
    feedback: Arc<FeedbackPlayer>,
    router: QueryRouter,
    config: SessionConfig,
    health_timeout: Duration,
    transcription_timeout: Duration,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl VoiceSessionController {
    pub fn new(
        collaborators: Collaborators,
        feedback: Arc<FeedbackPlayer>,
        router: QueryRouter,
        config: SessionConfig,
        services: &ServiceConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        let geolocator = CachedGeolocator::new(
            collaborators.geolocator,
            config.location_timeout(),
            config.location_max_age(),
        );
        Self {
            capture: collaborators.capture,
            transcriber: collaborators.transcriber,
            health: collaborators.health,
            geolocator,
            feedback,
            router,
            config,
            health_timeout: services.health_timeout(),
            transcription_timeout: services.transcription_timeout(),
            state: Mutex::new(SessionState {
                phase: SessionPhase::Idle,
                busy: false,
                recording: None,
                status: String::new(),
                last_heard: None,
            }),
            events,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn status(&self) -> String {
        self.lock().status.clone()
    }

    /// The last non-empty transcript, kept across sessions.
    pub fn last_heard(&self) -> Option<String> {
        self.lock().last_heard.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn feedback(&self) -> &Arc<FeedbackPlayer> {
        &self.feedback
    }

    /// Greets the user when the screen opens.
    pub async fn welcome(&self) {
        self.feedback.play(PromptKey::Welcome).await;
    }

    /// Handles a press of the microphone button.
    pub async fn press(&self) -> PressOutcome {
        let (_guard, recording) = {
            let mut state = self.lock();
            if state.busy || state.phase.is_processing() {
                debug!(phase = %state.phase, "press ignored while busy");
                return PressOutcome::Ignored;
            }
            state.busy = true;
            let recording = state.recording.take();
            (BusyGuard { state: &self.state }, recording)
        };

        self.feedback.stop_all().await;

        match recording {
            Some(recording) => {
                let span = recording.span.clone();
                PressOutcome::Finished(self.finish(recording).instrument(span).await)
            }
            None => self.start().await,
        }
    }

    /// Routes typed text exactly like a transcript, without capture.
    ///
    /// Returns `None` when another session is open or being processed.
    pub async fn submit_text(&self, text: &str) -> Option<SessionOutcome> {
        let _guard = self.try_claim()?;
        let span = info_span!("voice_session", session_id = %Uuid::new_v4(), source = "text");

        let outcome = async {
            let routing = self.router.route(text);
            info!(intent = %routing.intent, district = ?routing.district, "routed typed text");
            let status = format!(
                "DEBUG: intent={} | district={}",
                routing.intent,
                routing.district.map_or("null", |d| d.as_str())
            );
            self.enter(SessionPhase::Processing(ProcessingStage::Locating), Some(&status));
            let coordinates = self.geolocator.current_position().await;
            self.conclude(text.to_string(), routing, coordinates).await
        }
        .instrument(span)
        .await;
        Some(outcome)
    }

    /// Opens the results view for all pharmacies, near the user if possible.
    pub async fn browse_pharmacies(&self) -> Option<SessionOutcome> {
        let _guard = self.try_claim()?;
        let span = info_span!("voice_session", session_id = %Uuid::new_v4(), source = "browse");

        let outcome = async {
            self.enter(
                SessionPhase::Processing(ProcessingStage::Locating),
                Some(STATUS_LOCATING),
            );
            let coordinates = self.geolocator.current_position().await;
            let transcript = self
                .last_heard()
                .unwrap_or_else(|| DEFAULT_BROWSE_TRANSCRIPT.to_string());
            self.dispatch(DispatchRequest {
                transcript,
                intent: Intent::Pharmacy,
                district: None,
                coordinates,
            })
            .await
        }
        .instrument(span)
        .await;
        Some(outcome)
    }

    /// Tears the screen down: silences feedback and releases the microphone.
    pub async fn shutdown(&self) {
        self.feedback.stop_all().await;

        let recording = {
            let mut state = self.lock();
            let recording = state.recording.take();
            if recording.is_some() {
                state.phase = SessionPhase::Idle;
            }
            recording
        };
        if let Some(recording) = recording {
            info!(session_id = %recording.id, "discarding open recording");
            recording.handle.discard().await;
            if let Err(e) = self.capture.set_recording_mode(false).await {
                warn!(error = %e, "failed to leave recording mode");
            }
            let _ = self.events.send(SessionEvent::PhaseChanged(SessionPhase::Idle));
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn try_claim(&self) -> Option<BusyGuard<'_>> {
        let mut state = self.lock();
        if state.busy || state.recording.is_some() || state.phase.is_processing() {
            debug!(phase = %state.phase, "request ignored while a session is open");
            return None;
        }
        state.busy = true;
        Some(BusyGuard { state: &self.state })
    }

    fn enter(&self, phase: SessionPhase, status: Option<&str>) {
        {
            let mut state = self.lock();
            state.phase = phase;
            if let Some(status) = status {
                state.status = status.to_string();
            }
        }
        debug!(phase = %phase, status, "session phase");
        let _ = self.events.send(SessionEvent::PhaseChanged(phase));
    }

    fn set_status(&self, status: &str) {
        self.lock().status = status.to_string();
    }

    async fn start(&self) -> PressOutcome {
        let id = Uuid::new_v4();
        let span = info_span!("voice_session", session_id = %id);

        async {
            self.set_status(STATUS_LISTENING);

            match self.capture.request_permission().await {
                Ok(true) => {}
                Ok(false) => {
                    return PressOutcome::Finished(self.fail(SessionError::PermissionDenied).await)
                }
                Err(e) => return PressOutcome::Finished(self.fail(e.into()).await),
            }

            if let Err(e) = self.capture.set_recording_mode(true).await {
                self.leave_recording_mode().await;
                return PressOutcome::Finished(self.fail(e.into()).await);
            }

            let handle = match self.capture.start().await {
                Ok(handle) => handle,
                Err(e) => {
                    self.leave_recording_mode().await;
                    return PressOutcome::Finished(self.fail(e.into()).await);
                }
            };

            self.lock().recording = Some(RecordingSession {
                id,
                started_at: Instant::now(),
                handle,
                span: Span::current(),
            });
            self.enter(SessionPhase::Recording, Some(STATUS_LISTENING));
            info!("recording started");
            PressOutcome::RecordingStarted
        }
        .instrument(span)
        .await
    }

    async fn finish(&self, recording: RecordingSession) -> SessionOutcome {
        self.enter(
            SessionPhase::Processing(ProcessingStage::Warmup),
            Some(STATUS_PROCESSING),
        );

        let RecordingSession {
            handle, started_at, ..
        } = recording;
        let stopped = handle.stop().await;
        self.leave_recording_mode().await;

        let audio = match stopped {
            Ok(audio) => audio,
            Err(e) => return self.fail(e.into()).await,
        };
        info!(
            duration_ms = audio.duration.as_millis() as u64,
            held_ms = started_at.elapsed().as_millis() as u64,
            bytes = audio.bytes.len(),
            "recording stopped"
        );

        if audio.duration < self.config.min_recording() {
            info!("recording too short, discarded");
            return self
                .fall_back(FallbackReason::TooShort, Some(SessionError::NoSpeechDetected.user_status()))
                .await;
        }

        match self.process(&audio).await {
            Ok(outcome) => outcome,
            Err(e) => self.fail(e).await,
        }
    }

    async fn process(&self, audio: &CapturedAudio) -> Result<SessionOutcome, SessionError> {
        self.set_status(STATUS_WARMING_UP);
        self.warm_up().await?;

        self.enter(
            SessionPhase::Processing(ProcessingStage::Transcribing),
            Some(STATUS_TRANSCRIBING),
        );
        let transcription = tokio::time::timeout(
            self.transcription_timeout,
            self.transcriber.transcribe(audio),
        )
        .await
        .map_err(|_| SessionError::Timeout {
            operation: "transcription",
        })??;

        let text = transcription.text.trim();
        info!(
            chars = text.chars().count(),
            elapsed_s = transcription.elapsed_s,
            "transcription received"
        );
        if text.chars().count() < self.config.min_transcript_chars {
            return Ok(self
                .fall_back(FallbackReason::NoSpeech, Some(SessionError::NoSpeechDetected.user_status()))
                .await);
        }

        {
            let mut state = self.lock();
            state.last_heard = Some(text.to_string());
            state.status = format!("Reconnu: {text}");
        }

        let routing = self.router.route(text);
        info!(intent = %routing.intent, district = ?routing.district, "routed transcript");

        self.enter(
            SessionPhase::Processing(ProcessingStage::Locating),
            Some(STATUS_LOCATING),
        );
        let coordinates = self.geolocator.current_position().await;

        Ok(self.conclude(text.to_string(), routing, coordinates).await)
    }

    /// Probes both backends concurrently; search is reported first.
    async fn warm_up(&self) -> Result<(), SessionError> {
        let (search, transcription) =
            tokio::join!(self.probe(Backend::Search), self.probe(Backend::Transcription));
        if !search {
            return Err(SessionError::BackendUnavailable(Backend::Search));
        }
        if !transcription {
            return Err(SessionError::BackendUnavailable(Backend::Transcription));
        }
        Ok(())
    }

    async fn probe(&self, backend: Backend) -> bool {
        let timeout = self.health_timeout;
        match tokio::time::timeout(timeout, self.health.is_available(backend)).await {
            Ok(available) => available,
            Err(_) => {
                warn!(backend = %backend, timeout_ms = timeout.as_millis() as u64, "health check timed out");
                false
            }
        }
    }

    async fn conclude(
        &self,
        transcript: String,
        routing: RoutingResult,
        coordinates: Option<Coordinates>,
    ) -> SessionOutcome {
        if routing.intent.is_dispatchable() {
            return self
                .dispatch(DispatchRequest {
                    transcript,
                    intent: routing.intent,
                    district: routing.district,
                    coordinates,
                })
                .await;
        }

        let outcome = self.fall_back(FallbackReason::UnknownIntent, None).await;
        self.feedback.play(PromptKey::FallbackPharmaciesOrRetry).await;
        outcome
    }

    async fn dispatch(&self, request: DispatchRequest) -> SessionOutcome {
        // The results view narrates its own prompts.
        self.feedback.stop_all().await;
        self.enter(SessionPhase::Dispatched, None);
        info!(
            intent = %request.intent,
            district = ?request.district,
            located = request.coordinates.is_some(),
            "dispatching to results"
        );
        let _ = self
            .events
            .send(SessionEvent::NavigateToResults(request.clone()));
        SessionOutcome::Dispatched(request)
    }

    /// Enters `Fallback`. Short and noisy recordings get the repeat prompt
    /// here; an unknown intent raises the fallback affordance instead.
    async fn fall_back(&self, reason: FallbackReason, status: Option<&str>) -> SessionOutcome {
        self.enter(SessionPhase::Fallback, status);
        let last_heard = self.last_heard();
        info!(?reason, "session fell back");

        if reason == FallbackReason::UnknownIntent {
            let _ = self.events.send(SessionEvent::ShowFallback {
                last_heard: last_heard.clone(),
            });
        } else {
            self.feedback.play(PromptKey::RepeatPlease).await;
        }

        SessionOutcome::Fallback { reason, last_heard }
    }

    async fn fail(&self, err: SessionError) -> SessionOutcome {
        warn!(error = %err, "voice session failed");
        self.enter(SessionPhase::Failed, Some(err.user_status()));
        self.feedback.play(PromptKey::RepeatPlease).await;
        SessionOutcome::Failed(err)
    }

    async fn leave_recording_mode(&self) {
        if let Err(e) = self.capture.set_recording_mode(false).await {
            warn!(error = %e, "failed to leave recording mode");
        }
    }
}
