//! Inference: preprocessing, the predictor service, and the one-shot runner.

pub mod predictor;
pub mod preprocess;
pub mod runner;

pub use predictor::{ModelVariant, PredictionResult, Predictor, Probabilities};
pub use preprocess::{decode_base64, preprocess_base64, preprocess_bytes};
pub use runner::{OneShotRequest, OneShotResponse, DEFAULT_MODEL_PATH};
