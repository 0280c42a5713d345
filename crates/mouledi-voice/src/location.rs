//! Device position, best effort.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mouledi_types::Coordinates;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Source of the device position. `None` covers refusal and failure alike.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Option<Coordinates>;
}

/// Always reports the same position, or none.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedGeolocator {
    position: Option<Coordinates>,
}

impl FixedGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Option<Coordinates> {
        self.position
    }
}

/// Bounds a geolocator in time and reuses a recent fix.
pub struct CachedGeolocator {
    inner: Arc<dyn Geolocator>,
    timeout: Duration,
    max_age: Duration,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

impl CachedGeolocator {
    pub fn new(inner: Arc<dyn Geolocator>, timeout: Duration, max_age: Duration) -> Self {
        Self {
            inner,
            timeout,
            max_age,
            last_fix: Mutex::new(None),
        }
    }

    fn fresh_fix(&self) -> Option<Coordinates> {
        let guard = self.last_fix.lock().unwrap_or_else(|e| e.into_inner());
        (*guard).and_then(|(at, coords)| (at.elapsed() <= self.max_age).then_some(coords))
    }
}

#[async_trait]
impl Geolocator for CachedGeolocator {
    async fn current_position(&self) -> Option<Coordinates> {
        if let Some(coords) = self.fresh_fix() {
            debug!("reusing recent position fix");
            return Some(coords);
        }

        match tokio::time::timeout(self.timeout, self.inner.current_position()).await {
            Ok(Some(coords)) => {
                *self.last_fix.lock().unwrap_or_else(|e| e.into_inner()) =
                    Some((Instant::now(), coords));
                Some(coords)
            }
            Ok(None) => {
                debug!("position unavailable");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "position request timed out"
                );
                None
            }
        }
    }
}
