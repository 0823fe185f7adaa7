//! Shared server state

use demand_forecast::InferenceService;
use std::sync::Arc;
use std::time::Instant;

/// State shared across handlers
///
/// The inference service is immutable after load, so concurrent requests read
/// it without locking.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<InferenceService>,
    started: Instant,
}

impl AppState {
    pub fn new(service: InferenceService) -> Self {
        Self {
            service: Arc::new(service),
            started: Instant::now(),
        }
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
