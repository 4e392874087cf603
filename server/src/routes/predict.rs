//! Prediction endpoints
//!
//! `POST /predict` takes a JSON body with a base64 image (optionally a data
//! URL); `POST /predict-file` takes a multipart upload with a `file` field.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use mushroom_vision::inference::PredictionResult;
use mushroom_vision::MushroomError;

use crate::state::SharedState;

/// Error payload; bad input maps to 400, everything else to 500
pub struct ApiError(MushroomError);

impl From<MushroomError> for ApiError {
    fn from(e: MushroomError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MushroomError::InvalidImage(_) | MushroomError::MissingInput(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("prediction failed: {}", self.0);
        }

        let body = serde_json::json!({
            "success": false,
            "error": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
pub struct PredictRequest {
    /// Base64-encoded image, optionally a data URL
    pub image: Option<String>,
}

#[derive(Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub result: PredictionResult,
}

/// POST /predict - Classify a base64-encoded image
pub async fn predict(
    State(state): State<SharedState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let payload = request
        .image
        .ok_or_else(|| MushroomError::MissingInput("image".to_string()))?;

    let predictor = state
        .predictor
        .as_ref()
        .ok_or_else(|| MushroomError::ModelNotFound(state.config.model_path.clone()))?;

    let result = predictor.predict_base64(&payload)?;
    Ok(Json(PredictResponse {
        success: true,
        result,
    }))
}

/// POST /predict-file - Classify an uploaded image file
pub async fn predict_file(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError> {
    let mut bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MushroomError::InvalidImage(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| MushroomError::InvalidImage(format!("failed to read upload: {e}")))?;
            bytes = Some(data);
            break;
        }
    }

    let bytes = bytes.ok_or_else(|| MushroomError::MissingInput("file".to_string()))?;

    let predictor = state
        .predictor
        .as_ref()
        .ok_or_else(|| MushroomError::ModelNotFound(state.config.model_path.clone()))?;

    let result = predictor.predict_bytes(&bytes)?;
    Ok(Json(PredictResponse {
        success: true,
        result,
    }))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::state::{AppState, ServerConfig};

    fn empty_state() -> SharedState {
        Arc::new(AppState::new(
            ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                model_path: PathBuf::from("/nonexistent"),
            },
            None,
        ))
    }

    #[tokio::test]
    async fn test_missing_image_is_bad_request() {
        let result = predict(State(empty_state()), Json(PredictRequest { image: None })).await;
        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_model_is_server_error() {
        let request = PredictRequest {
            image: Some("aGVsbG8=".to_string()),
        };
        let result = predict(State(empty_state()), Json(request)).await;
        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
