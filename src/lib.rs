//! # Mushroom Vision
//!
//! A Rust library for classifying mushroom photographs as edible or poisonous
//! using the Burn framework.
//!
//! ## Modules
//!
//! - `dataset`: Directory scanning, stratified splits, batching, and augmentation
//! - `model`: The CNN and transfer-learning ResNet architectures plus snapshot I/O
//! - `training`: The supervised training loop with validation and LR scheduling
//! - `inference`: Image preprocessing, the predictor service, and the one-shot runner
//! - `utils`: Logging and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mushroom_vision::backend::{default_device, DefaultBackend};
//! use mushroom_vision::inference::predictor::Predictor;
//!
//! let device = default_device();
//! let predictor = Predictor::<DefaultBackend>::load("models/mushroom_cnn".as_ref(), &device)?;
//! let result = predictor.predict_bytes(&image_bytes)?;
//! println!("{} ({:.1}%)", result.prediction, result.confidence * 100.0);
//! ```

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::loader::{scan_dataset, ClassLabel, ImageSample};
pub use dataset::split::{DatasetSplits, SplitConfig};
pub use dataset::{MushroomBatch, MushroomBatcher, MushroomItem};
pub use inference::predictor::{PredictionResult, Predictor};
pub use inference::runner::{OneShotRequest, OneShotResponse};
pub use model::cnn::MushroomCnn;
pub use model::resnet::TransferResNet;
pub use model::snapshot::{Architecture, SnapshotMeta};
pub use training::{TrainingConfig, TrainingHistory};
pub use utils::error::{MushroomError, Result};

/// Binary classification: edible vs poisonous
pub const NUM_CLASSES: usize = 2;

/// Default square resolution images are resized to before entering the network
pub const DEFAULT_IMAGE_SIZE: usize = 256;

/// ImageNet per-channel mean, applied after scaling pixels to [0, 1]
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
