//! One-shot Request Runner
//!
//! Parses a single JSON request, runs one prediction, and produces the JSON
//! response plus a process exit code. The stdin/stdout wiring lives in the
//! `predict_once` binary; everything here is plain and testable.
//!
//! Request: `{"image": "<base64>", "model_path": "optional/path"}`
//! Response: `{"success": true, "result": {...}}` or
//! `{"success": false, "error": "..."}` with exit code 1.

use std::path::Path;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::inference::predictor::{PredictionResult, Predictor};
use crate::inference::preprocess;
use crate::utils::error::{MushroomError, Result};

/// Default snapshot stem consulted when the request carries no `model_path`
pub const DEFAULT_MODEL_PATH: &str = "models/mushroom_cnn";

#[derive(Debug, Clone, Deserialize)]
pub struct OneShotRequest {
    /// Base64-encoded image, optionally a data URL
    pub image: Option<String>,
    /// Snapshot path override
    pub model_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneShotResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PredictionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OneShotResponse {
    pub fn ok(result: PredictionResult) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Handle one JSON request string; every failure maps to an error response
fn handle_request<B: Backend>(input: &str, device: &B::Device) -> Result<PredictionResult> {
    let request: OneShotRequest = serde_json::from_str(input)
        .map_err(|e| MushroomError::InvalidImage(format!("malformed request: {e}")))?;

    let payload = request
        .image
        .ok_or_else(|| MushroomError::MissingInput("image".to_string()))?;

    // Decode before touching the model so payload errors fail fast
    let bytes = preprocess::decode_base64(&payload)?;

    let model_path = request
        .model_path
        .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());
    let predictor = Predictor::<B>::load(Path::new(&model_path), device)?;

    predictor.predict_bytes(&bytes)
}

/// Run one request, returning the response and the process exit code
pub fn run<B: Backend>(input: &str, device: &B::Device) -> (OneShotResponse, i32) {
    match handle_request::<B>(input, device) {
        Ok(result) => (OneShotResponse::ok(result), 0),
        Err(e) => (OneShotResponse::failure(e.to_string()), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    fn run_one(input: &str) -> (OneShotResponse, i32) {
        run::<DefaultBackend>(input, &Default::default())
    }

    #[test]
    fn test_malformed_json_fails() {
        let (response, code) = run_one("not json at all");
        assert_eq!(code, 1);
        assert!(!response.success);
        assert!(!response.error.unwrap().is_empty());
    }

    #[test]
    fn test_missing_image_field_fails() {
        let (response, code) = run_one(r#"{"model_path": "somewhere"}"#);
        assert_eq!(code, 1);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("image"));
    }

    #[test]
    fn test_malformed_base64_fails_before_model_load() {
        // The model path does not exist; a base64 failure must win
        let (response, code) =
            run_one(r#"{"image": "!!not-base64!!", "model_path": "/nonexistent"}"#);
        assert_eq!(code, 1);
        assert!(!response.success);
        let error = response.error.unwrap();
        assert!(error.contains("base64"), "unexpected error: {error}");
    }

    #[test]
    fn test_missing_model_reported() {
        let png = image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        png.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        let encoded = {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        };

        let input = format!(
            r#"{{"image": "{encoded}", "model_path": "/definitely/missing/model"}}"#
        );
        let (response, code) = run_one(&input);
        assert_eq!(code, 1);
        assert!(!response.success);
    }

    #[test]
    fn test_failure_response_omits_result_key() {
        let (response, _) = run_one("{}");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(!json.contains("\"result\""));
    }
}
