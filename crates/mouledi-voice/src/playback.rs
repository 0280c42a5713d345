//! Audio output seam.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::error::AudioError;

/// The platform audio output.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Switches the platform audio session to playback (recording off).
    async fn set_playback_mode(&self) -> Result<(), AudioError>;

    /// Loads a clip without starting it.
    async fn load(&self, url: &str) -> Result<Arc<dyn PlaybackHandle>, AudioError>;
}

/// A loaded clip.
#[async_trait]
pub trait PlaybackHandle: Send + Sync {
    async fn play(&self) -> Result<(), AudioError>;

    async fn stop(&self) -> Result<(), AudioError>;

    /// Releases the clip. Safe to call more than once.
    async fn unload(&self) -> Result<(), AudioError>;

    /// Resolves once the clip is no longer playing, whether it ran to the
    /// end, was stopped or was unloaded.
    async fn finished(&self);
}

/// Output for hosts without a speaker: logs each clip and completes at once.
#[derive(Debug, Default, Clone)]
pub struct LoggingOutput;

impl LoggingOutput {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioOutput for LoggingOutput {
    async fn set_playback_mode(&self) -> Result<(), AudioError> {
        Ok(())
    }

    async fn load(&self, url: &str) -> Result<Arc<dyn PlaybackHandle>, AudioError> {
        let (done, _) = watch::channel(false);
        Ok(Arc::new(LoggedClip {
            url: url.to_string(),
            done,
        }))
    }
}

struct LoggedClip {
    url: String,
    done: watch::Sender<bool>,
}

#[async_trait]
impl PlaybackHandle for LoggedClip {
    async fn play(&self) -> Result<(), AudioError> {
        info!(url = %self.url, "feedback prompt");
        self.done.send_replace(true);
        Ok(())
    }

    async fn stop(&self) -> Result<(), AudioError> {
        self.done.send_replace(true);
        Ok(())
    }

    async fn unload(&self) -> Result<(), AudioError> {
        self.done.send_replace(true);
        Ok(())
    }

    async fn finished(&self) {
        let mut rx = self.done.subscribe();
        // The sender lives as long as `self`, so this only returns once done.
        let _ = rx.wait_for(|done| *done).await;
    }
}
