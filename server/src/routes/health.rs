//! Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub model_loaded: bool,
}

/// GET /health - Health check endpoint
///
/// Answers even when no model snapshot could be loaded at startup.
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Mushroom classifier API is running".to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: state.predictor.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::state::{AppState, ServerConfig};

    #[tokio::test]
    async fn test_health_answers_without_model() {
        let state = Arc::new(AppState::new(
            ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                model_path: PathBuf::from("/nonexistent"),
            },
            None,
        ));

        let Json(response) = health_check(State(state)).await;
        assert_eq!(response.status, "healthy");
        assert!(!response.model_loaded);
    }
}
