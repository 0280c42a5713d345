#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mouledi_nlu::QueryRouter;
use mouledi_types::{Backend, Coordinates, PromptKey, ProviderQuery, ProviderRecord};
use mouledi_voice::{
    ActiveCapture, AudioCapture, AudioError, AudioFormat, AudioOutput, CaptureError,
    CapturedAudio, Collaborators, FeedbackPlayer, FixedGeolocator, HealthProbe, PlaybackHandle,
    PromptResolver, ProviderSearch, ServiceConfig, ServiceError, SessionConfig, Transcriber,
    Transcription, VoiceSessionController,
};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// Feedback audio
// ---------------------------------------------------------------------------

/// Resolves every key to `mem://<key>`, optionally after a per-key delay.
#[derive(Default)]
pub struct FakeResolver {
    delays: Mutex<HashMap<PromptKey, Duration>>,
    missing: Mutex<Vec<PromptKey>>,
    requested: Mutex<Vec<PromptKey>>,
    languages: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delay(&self, key: PromptKey, delay: Duration) {
        self.delays.lock().unwrap().insert(key, delay);
    }

    pub fn remove(&self, key: PromptKey) {
        self.missing.lock().unwrap().push(key);
    }

    pub fn requested(&self) -> Vec<PromptKey> {
        self.requested.lock().unwrap().clone()
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }
}

pub fn url_for(key: PromptKey) -> String {
    format!("mem://{}", key.as_str())
}

#[async_trait]
impl PromptResolver for FakeResolver {
    async fn resolve(&self, key: PromptKey, language: &str) -> Result<String, ServiceError> {
        self.requested.lock().unwrap().push(key);
        self.languages.lock().unwrap().push(language.to_string());
        let delay = self.delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.missing.lock().unwrap().contains(&key) {
            return Err(ServiceError::NotFound(key.as_str().to_string()));
        }
        Ok(url_for(key))
    }
}

#[derive(Default)]
struct Audible {
    now: AtomicUsize,
    max: AtomicUsize,
}

pub struct FakeClip {
    pub url: String,
    played: AtomicBool,
    silenced: AtomicBool,
    unloads: AtomicUsize,
    done: watch::Sender<bool>,
    audible: Arc<Audible>,
}

impl FakeClip {
    pub fn was_played(&self) -> bool {
        self.played.load(Ordering::SeqCst)
    }

    pub fn was_unloaded(&self) -> bool {
        self.unloads.load(Ordering::SeqCst) > 0
    }

    pub fn is_audible(&self) -> bool {
        self.was_played() && !self.silenced.load(Ordering::SeqCst)
    }

    /// Simulates the clip running to its end.
    pub fn complete(&self) {
        self.silence();
    }

    fn silence(&self) {
        let was_silenced = self.silenced.swap(true, Ordering::SeqCst);
        if !was_silenced && self.was_played() {
            self.audible.now.fetch_sub(1, Ordering::SeqCst);
        }
        self.done.send_replace(true);
    }
}

#[async_trait]
impl PlaybackHandle for FakeClip {
    async fn play(&self) -> Result<(), AudioError> {
        if self.silenced.load(Ordering::SeqCst) {
            return Err(AudioError::Playback("clip already released".to_string()));
        }
        self.played.store(true, Ordering::SeqCst);
        let now = self.audible.now.fetch_add(1, Ordering::SeqCst) + 1;
        self.audible.max.fetch_max(now, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), AudioError> {
        self.silence();
        Ok(())
    }

    async fn unload(&self) -> Result<(), AudioError> {
        self.unloads.fetch_add(1, Ordering::SeqCst);
        self.silence();
        Ok(())
    }

    async fn finished(&self) {
        let mut rx = self.done.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }
}

/// Records every clip it loads and tracks how many are audible at once.
#[derive(Default)]
pub struct FakeOutput {
    load_delays: Mutex<HashMap<String, Duration>>,
    clips: Mutex<Vec<Arc<FakeClip>>>,
    audible: Arc<Audible>,
    playback_mode_switches: AtomicUsize,
}

impl FakeOutput {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delay_load(&self, key: PromptKey, delay: Duration) {
        self.load_delays.lock().unwrap().insert(url_for(key), delay);
    }

    pub fn clips(&self) -> Vec<Arc<FakeClip>> {
        self.clips.lock().unwrap().clone()
    }

    pub fn clip(&self, key: PromptKey) -> Option<Arc<FakeClip>> {
        let url = url_for(key);
        self.clips().into_iter().find(|c| c.url == url)
    }

    pub fn played(&self) -> Vec<String> {
        self.clips()
            .into_iter()
            .filter(|c| c.was_played())
            .map(|c| c.url.clone())
            .collect()
    }

    pub fn audible_now(&self) -> usize {
        self.clips().iter().filter(|c| c.is_audible()).count()
    }

    pub fn max_audible(&self) -> usize {
        self.audible.max.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn set_playback_mode(&self) -> Result<(), AudioError> {
        self.playback_mode_switches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, url: &str) -> Result<Arc<dyn PlaybackHandle>, AudioError> {
        let delay = self.load_delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let (done, _) = watch::channel(false);
        let clip = Arc::new(FakeClip {
            url: url.to_string(),
            played: AtomicBool::new(false),
            silenced: AtomicBool::new(false),
            unloads: AtomicUsize::new(0),
            done,
            audible: Arc::clone(&self.audible),
        });
        self.clips.lock().unwrap().push(Arc::clone(&clip));
        Ok(clip)
    }
}

pub fn feedback_player(resolver: &Arc<FakeResolver>, output: &Arc<FakeOutput>) -> Arc<FeedbackPlayer> {
    Arc::new(FeedbackPlayer::new(
        Arc::clone(resolver) as Arc<dyn PromptResolver>,
        Arc::clone(output) as Arc<dyn AudioOutput>,
        "mina",
    ))
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CaptureCounters {
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
    pub discarded: AtomicUsize,
    pub recording_mode: AtomicBool,
}

impl CaptureCounters {
    /// Recordings opened and not yet stopped or discarded.
    pub fn open(&self) -> usize {
        self.started.load(Ordering::SeqCst)
            - self.stopped.load(Ordering::SeqCst)
            - self.discarded.load(Ordering::SeqCst)
    }
}

pub struct FakeCapture {
    pub granted: AtomicBool,
    /// Entering recording mode switches the device, then reports an error.
    pub mode_switch_fails: AtomicBool,
    duration: Mutex<Duration>,
    pub counters: Arc<CaptureCounters>,
}

impl FakeCapture {
    pub fn new(duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            granted: AtomicBool::new(true),
            mode_switch_fails: AtomicBool::new(false),
            duration: Mutex::new(duration),
            counters: Arc::new(CaptureCounters::default()),
        })
    }

    pub fn set_duration(&self, duration: Duration) {
        *self.duration.lock().unwrap() = duration;
    }
}

#[async_trait]
impl AudioCapture for FakeCapture {
    async fn request_permission(&self) -> Result<bool, CaptureError> {
        Ok(self.granted.load(Ordering::SeqCst))
    }

    async fn set_recording_mode(&self, recording: bool) -> Result<(), CaptureError> {
        self.counters.recording_mode.store(recording, Ordering::SeqCst);
        if recording && self.mode_switch_fails.load(Ordering::SeqCst) {
            return Err(CaptureError::Device("audio session busy".to_string()));
        }
        Ok(())
    }

    async fn start(&self) -> Result<Box<dyn ActiveCapture>, CaptureError> {
        self.counters.started.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRecording {
            duration: *self.duration.lock().unwrap(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FakeRecording {
    duration: Duration,
    counters: Arc<CaptureCounters>,
}

#[async_trait]
impl ActiveCapture for FakeRecording {
    async fn stop(self: Box<Self>) -> Result<CapturedAudio, CaptureError> {
        self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(CapturedAudio {
            bytes: vec![0u8; 2048],
            duration: self.duration,
            format: AudioFormat::WEBM,
        })
    }

    async fn discard(self: Box<Self>) {
        self.counters.discarded.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

pub struct FakeTranscriber {
    text: Mutex<String>,
    failure_status: Mutex<Option<u16>>,
    delay: Mutex<Duration>,
    pub calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Mutex::new(text.to_string()),
            failure_status: Mutex::new(None),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_text(&self, text: &str) {
        *self.text.lock().unwrap() = text.to_string();
    }

    pub fn fail_with(&self, status: u16) {
        *self.failure_status.lock().unwrap() = Some(status);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &CapturedAudio) -> Result<Transcription, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = *self.failure_status.lock().unwrap() {
            return Err(ServiceError::Http {
                operation: "transcription",
                status,
                body: "upstream failure".to_string(),
            });
        }
        Ok(Transcription {
            text: self.text.lock().unwrap().clone(),
            elapsed_s: Some(0.4),
        })
    }
}

pub struct FakeHealth {
    pub search: AtomicBool,
    pub transcription: AtomicBool,
    pub calls: AtomicUsize,
    delay: Mutex<Duration>,
}

impl FakeHealth {
    pub fn up() -> Arc<Self> {
        Arc::new(Self {
            search: AtomicBool::new(true),
            transcription: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl HealthProbe for FakeHealth {
    async fn is_available(&self, backend: Backend) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match backend {
            Backend::Search => self.search.load(Ordering::SeqCst),
            Backend::Transcription => self.transcription.load(Ordering::SeqCst),
        }
    }
}

/// Answers on-call and plain searches from separate canned lists.
#[derive(Default)]
pub struct FakeSearch {
    pub on_call: Mutex<Vec<ProviderRecord>>,
    pub all: Mutex<Vec<ProviderRecord>>,
    pub fail: AtomicBool,
    queries: Mutex<Vec<ProviderQuery>>,
}

impl FakeSearch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queries(&self) -> Vec<ProviderQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderSearch for FakeSearch {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<ProviderRecord>, ServiceError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Http {
                operation: "provider search",
                status: 500,
                body: "boom".to_string(),
            });
        }
        if query.on_call_now {
            Ok(self.on_call.lock().unwrap().clone())
        } else {
            Ok(self.all.lock().unwrap().clone())
        }
    }
}

pub fn provider(name: &str, phone: &str) -> ProviderRecord {
    ProviderRecord {
        provider_id: None,
        kind: None,
        name: name.to_string(),
        phone: Some(phone.to_string()),
        address: None,
        district: None,
        city: None,
        is_on_call_now: false,
        distance_km: None,
    }
}

// ---------------------------------------------------------------------------
// Controller harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub capture: Arc<FakeCapture>,
    pub transcriber: Arc<FakeTranscriber>,
    pub health: Arc<FakeHealth>,
    pub resolver: Arc<FakeResolver>,
    pub output: Arc<FakeOutput>,
    pub controller: Arc<VoiceSessionController>,
}

impl Harness {
    pub fn new(transcript: &str, position: Option<Coordinates>) -> Self {
        Self::with_config(
            transcript,
            position,
            SessionConfig::default(),
            ServiceConfig::default(),
        )
    }

    pub fn with_config(
        transcript: &str,
        position: Option<Coordinates>,
        config: SessionConfig,
        services: ServiceConfig,
    ) -> Self {
        let capture = FakeCapture::new(Duration::from_secs(2));
        let transcriber = FakeTranscriber::new(transcript);
        let health = FakeHealth::up();
        let resolver = FakeResolver::new();
        let output = FakeOutput::new();

        let controller = VoiceSessionController::new(
            Collaborators {
                capture: capture.clone(),
                transcriber: transcriber.clone(),
                health: health.clone(),
                geolocator: Arc::new(FixedGeolocator::new(position)),
            },
            feedback_player(&resolver, &output),
            QueryRouter::default(),
            config,
            &services,
        );

        Self {
            capture,
            transcriber,
            health,
            resolver,
            output,
            controller: Arc::new(controller),
        }
    }
}
