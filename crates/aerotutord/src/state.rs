//! Shared daemon state

use aero_common::{LoadedConfig, PolicyMediator};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Application state shared across handlers
pub struct AppState {
    pub mediator: Arc<PolicyMediator>,
    pub loaded: LoadedConfig,
    pub start_time: Instant,
    /// One corpus rebuild at a time
    pub reindex_lock: Mutex<()>,
}

impl AppState {
    pub fn new(mediator: PolicyMediator, loaded: LoadedConfig) -> Self {
        Self {
            mediator: Arc::new(mediator),
            loaded,
            start_time: Instant::now(),
            reindex_lock: Mutex::new(()),
        }
    }

    /// Build the full pipeline from configuration
    pub fn from_config(loaded: LoadedConfig) -> Self {
        let mediator = PolicyMediator::from_config(&loaded);
        Self::new(mediator, loaded)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
