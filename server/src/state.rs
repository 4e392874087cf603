//! Application state for the mushroom classifier server

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use mushroom_vision::backend::DefaultBackend;
use mushroom_vision::inference::Predictor;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Path to the model snapshot
    pub model_path: PathBuf,
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    /// Loaded at startup; `None` when the snapshot is missing, in which case
    /// the health endpoint still answers but predictions fail
    pub predictor: Option<Predictor<DefaultBackend>>,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig, predictor: Option<Predictor<DefaultBackend>>) -> Self {
        Self {
            config,
            predictor,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;
