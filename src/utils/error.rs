//! Error Handling Module
//!
//! Defines the error types shared across the mushroom classification library.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for mushroom classification operations
#[derive(Error, Debug)]
pub enum MushroomError {
    /// Input could not be decoded as an image (or the base64 payload is malformed)
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A required field was absent from a request
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Parameter snapshot path does not exist
    #[error("Model snapshot not found: {0}")]
    ModelNotFound(PathBuf),

    /// Snapshot layer set does not match the target architecture
    #[error("Snapshot does not match the '{architecture}' architecture: {detail}")]
    ArchitectureMismatch { architecture: String, detail: String },

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// Error during inference
    #[error("Inference error: {0}")]
    Inference(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MushroomError {
    fn from(err: serde_json::Error) -> Self {
        MushroomError::Serialization(err.to_string())
    }
}

/// Convenience Result type for mushroom classification operations
pub type Result<T> = std::result::Result<T, MushroomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MushroomError::Dataset("no samples found".to_string());
        assert_eq!(format!("{}", err), "Dataset error: no samples found");
    }

    #[test]
    fn test_model_not_found_display() {
        let err = MushroomError::ModelNotFound(PathBuf::from("/models/missing.mpk"));
        assert!(format!("{}", err).contains("missing.mpk"));
    }

    #[test]
    fn test_architecture_mismatch_display() {
        let err = MushroomError::ArchitectureMismatch {
            architecture: "cnn".to_string(),
            detail: "shape mismatch".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("cnn"));
        assert!(msg.contains("shape mismatch"));
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("not json");
        let err: MushroomError = parse.unwrap_err().into();
        assert!(matches!(err, MushroomError::Serialization(_)));
    }
}
