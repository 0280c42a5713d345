//! Spoken feedback prompts.
//!
//! At most one prompt is audible at a time and only the most recently
//! requested one may ever become audible. Every request takes a number from
//! a monotonic counter; after each await the request checks that its number
//! is still the latest, and gives up (unloading whatever it loaded) as soon
//! as it is not. Claiming the active slot happens under the same lock as that
//! check, so a superseded request can never install itself over a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use mouledi_types::PromptKey;
use tracing::{debug, warn};

use crate::playback::{AudioOutput, PlaybackHandle};
use crate::services::PromptResolver;

struct ActivePlayback {
    seq: u64,
    key: PromptKey,
    handle: Arc<dyn PlaybackHandle>,
}

type ActiveSlot = Arc<Mutex<Option<ActivePlayback>>>;

/// Plays feedback prompts, newest request wins.
pub struct FeedbackPlayer {
    resolver: Arc<dyn PromptResolver>,
    output: Arc<dyn AudioOutput>,
    language: String,
    seq: AtomicU64,
    active: ActiveSlot,
}

impl FeedbackPlayer {
    pub fn new(
        resolver: Arc<dyn PromptResolver>,
        output: Arc<dyn AudioOutput>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            output,
            language: language.into(),
            seq: AtomicU64::new(0),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Plays `key` in the configured language.
    pub async fn play(&self, key: PromptKey) {
        let language = self.language.clone();
        self.play_in(key, &language).await;
    }

    /// Plays `key` in `language`. Never fails: every error is logged and the
    /// prompt is skipped.
    pub async fn play_in(&self, key: PromptKey, language: &str) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, key = %key, "feedback requested");

        self.stop_current().await;

        let url = match self.resolver.resolve(key, language).await {
            Ok(url) => url,
            Err(e) => {
                warn!(seq, key = %key, language, error = %e, "feedback prompt unavailable");
                return;
            }
        };
        if !self.is_latest(seq) {
            debug!(seq, key = %key, "superseded after resolve");
            return;
        }

        if let Err(e) = self.output.set_playback_mode().await {
            warn!(seq, error = %e, "failed to switch audio to playback");
        }

        let handle = match self.output.load(&url).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(seq, key = %key, url = %url, error = %e, "failed to load feedback prompt");
                return;
            }
        };

        let displaced = {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            if !self.is_latest(seq) {
                None
            } else {
                let previous = active.replace(ActivePlayback {
                    seq,
                    key,
                    handle: Arc::clone(&handle),
                });
                Some(previous)
            }
        };
        let Some(previous) = displaced else {
            debug!(seq, key = %key, "superseded after load");
            release(&handle).await;
            return;
        };
        if let Some(previous) = previous {
            release(&previous.handle).await;
        }

        if let Err(e) = handle.play().await {
            warn!(seq, key = %key, error = %e, "failed to start feedback prompt");
            self.clear_if_current(seq).await;
            return;
        }
        if !self.is_latest(seq) {
            debug!(seq, key = %key, "superseded while starting");
            release(&handle).await;
            return;
        }

        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            handle.finished().await;
            if let Some(done) = take_if_current(&active, seq) {
                debug!(seq, key = %done.key, "feedback finished");
                if let Err(e) = done.handle.unload().await {
                    debug!(seq, error = %e, "failed to unload finished prompt");
                }
            }
        });
    }

    /// Silences the current prompt and cancels every pending request.
    pub async fn stop_all(&self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
        self.stop_current().await;
    }

    /// Whether a prompt currently holds the output.
    pub fn is_playing(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// The prompt currently holding the output, if any.
    pub fn active_key(&self) -> Option<PromptKey> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|a| a.key)
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == seq
    }

    async fn stop_current(&self) {
        let current = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(current) = current {
            debug!(seq = current.seq, key = %current.key, "stopping feedback");
            release(&current.handle).await;
        }
    }

    async fn clear_if_current(&self, seq: u64) {
        if let Some(current) = take_if_current(&self.active, seq) {
            release(&current.handle).await;
        }
    }
}

/// Empties the slot only if it still holds playback `seq`.
fn take_if_current(slot: &Mutex<Option<ActivePlayback>>, seq: u64) -> Option<ActivePlayback> {
    let mut slot = slot.lock().unwrap_or_else(|e| e.into_inner());
    if slot.as_ref().is_some_and(|current| current.seq == seq) {
        slot.take()
    } else {
        None
    }
}

/// Stops then unloads; both best effort.
async fn release(handle: &Arc<dyn PlaybackHandle>) {
    if let Err(e) = handle.stop().await {
        debug!(error = %e, "failed to stop prompt");
    }
    if let Err(e) = handle.unload().await {
        debug!(error = %e, "failed to unload prompt");
    }
}
