//! Predictor Service
//!
//! An explicitly constructed service object holding a loaded model, its
//! snapshot metadata, and the device. Handlers receive it by reference
//! instead of reading process-wide state, which also makes it easy to test
//! with freshly initialized models.

use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::tensor::activation::softmax;
use serde::{Deserialize, Serialize};

use crate::inference::preprocess;
use crate::model::cnn::MushroomCnnConfig;
use crate::model::resnet::TransferResNetConfig;
use crate::model::snapshot::{self, Architecture, SnapshotMeta};
use crate::model::{ImageClassifier, MushroomCnn, TransferResNet};
use crate::utils::error::{MushroomError, Result};

/// Per-class probabilities from softmax; the two sum to ~1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub edible: f32,
    pub poisonous: f32,
}

/// Result of one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// "edible" or "poisonous"
    pub prediction: String,
    /// Probability of the predicted class
    pub confidence: f32,
    pub probabilities: Probabilities,
}

/// A loaded classifier of either architecture
#[derive(Debug)]
pub enum ModelVariant<B: Backend> {
    Cnn(MushroomCnn<B>),
    Resnet18(TransferResNet<B>),
}

impl<B: Backend> ModelVariant<B> {
    /// Construct the architecture named by `meta` and load its weights
    pub fn load(meta: &SnapshotMeta, stem: &Path, device: &B::Device) -> Result<Self> {
        match meta.architecture {
            Architecture::Cnn => {
                let model = MushroomCnnConfig::new()
                    .with_num_classes(meta.num_classes)
                    .with_image_size(meta.image_size)
                    .init::<B>(device);
                Ok(Self::Cnn(snapshot::load_weights(model, meta, stem, device)?))
            }
            Architecture::Resnet18 => {
                let model = TransferResNetConfig::new()
                    .with_num_classes(meta.num_classes)
                    .init::<B>(device);
                Ok(Self::Resnet18(snapshot::load_weights(
                    model, meta, stem, device,
                )?))
            }
        }
    }

    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        match self {
            Self::Cnn(model) => model.forward(images),
            Self::Resnet18(model) => model.forward(images),
        }
    }
}

/// The prediction service
#[derive(Debug)]
pub struct Predictor<B: Backend> {
    model: ModelVariant<B>,
    meta: SnapshotMeta,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    /// Load a predictor from a snapshot path (stem or `.mpk` file)
    ///
    /// When the path does not exist, one retry is made against the same path
    /// relative to the running executable's directory before failing with
    /// [`MushroomError::ModelNotFound`].
    pub fn load(path: &Path, device: &B::Device) -> Result<Self> {
        let stem = resolve_snapshot(path)?;
        let meta = snapshot::load_meta(&stem)?;
        let model = ModelVariant::load(&meta, &stem, device)?;

        Ok(Self {
            model,
            meta,
            device: device.clone(),
        })
    }

    /// Build a predictor from an already constructed model
    pub fn from_parts(model: ModelVariant<B>, meta: SnapshotMeta, device: B::Device) -> Self {
        Self {
            model,
            meta,
            device,
        }
    }

    /// The image size the snapshot was trained with
    pub fn image_size(&self) -> usize {
        self.meta.image_size
    }

    pub fn architecture(&self) -> Architecture {
        self.meta.architecture
    }

    /// Classify raw image bytes
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<PredictionResult> {
        let input = preprocess::preprocess_bytes(bytes, self.meta.image_size, &self.device)?;
        self.predict_tensor(input)
    }

    /// Classify a base64 payload (optionally a data URL)
    pub fn predict_base64(&self, payload: &str) -> Result<PredictionResult> {
        let bytes = preprocess::decode_base64(payload)?;
        self.predict_bytes(&bytes)
    }

    /// Classify an already preprocessed `[1, 3, S, S]` tensor
    pub fn predict_tensor(&self, input: Tensor<B, 4>) -> Result<PredictionResult> {
        let logits = self.model.forward(input);
        let probs: Vec<f32> = softmax(logits, 1)
            .into_data()
            .to_vec()
            .map_err(|e| MushroomError::Inference(format!("{e:?}")))?;

        let [edible, poisonous] = probs[..] else {
            return Err(MushroomError::Inference(format!(
                "expected 2 class probabilities, got {}",
                probs.len()
            )));
        };

        // Ties go to edible
        let (prediction, confidence) = if edible >= poisonous {
            ("edible", edible)
        } else {
            ("poisonous", poisonous)
        };

        Ok(PredictionResult {
            prediction: prediction.to_string(),
            confidence,
            probabilities: Probabilities { edible, poisonous },
        })
    }
}

/// Resolve a snapshot path, retrying relative to the executable's directory
fn resolve_snapshot(path: &Path) -> Result<PathBuf> {
    let stem = snapshot::snapshot_stem(path);
    if snapshot::weights_path(&stem).exists() {
        return Ok(stem);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let relative = dir.join(&stem);
            if snapshot::weights_path(&relative).exists() {
                return Ok(relative);
            }
        }
    }

    Err(MushroomError::ModelNotFound(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    fn fresh_predictor(image_size: usize) -> Predictor<DefaultBackend> {
        let device = Default::default();
        let model = MushroomCnnConfig::new()
            .with_image_size(image_size)
            .init::<DefaultBackend>(&device);
        Predictor::from_parts(
            ModelVariant::Cnn(model),
            SnapshotMeta::new(Architecture::Cnn, image_size, 2),
            device,
        )
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let predictor = fresh_predictor(32);
        let input = Tensor::<DefaultBackend, 4>::random(
            [1, 3, 32, 32],
            burn::tensor::Distribution::Uniform(-1.0, 1.0),
            &Default::default(),
        );

        let result = predictor.predict_tensor(input).unwrap();
        let sum = result.probabilities.edible + result.probabilities.poisonous;
        assert!((sum - 1.0).abs() < 1e-5, "probabilities sum to {sum}");
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_confidence_matches_predicted_class() {
        let predictor = fresh_predictor(32);
        let input =
            Tensor::<DefaultBackend, 4>::zeros([1, 3, 32, 32], &Default::default());

        let result = predictor.predict_tensor(input).unwrap();
        let expected = if result.prediction == "edible" {
            result.probabilities.edible
        } else {
            result.probabilities.poisonous
        };
        assert_eq!(result.confidence, expected);
    }

    #[test]
    fn test_missing_snapshot_is_model_not_found() {
        let device = Default::default();
        let result =
            Predictor::<DefaultBackend>::load(Path::new("/nonexistent/model"), &device);
        assert!(matches!(result, Err(MushroomError::ModelNotFound(_))));
    }

    #[test]
    fn test_predict_bytes_uses_snapshot_image_size() {
        let predictor = fresh_predictor(32);
        assert_eq!(predictor.image_size(), 32);

        let img = image::RgbImage::from_pixel(50, 50, image::Rgb([90, 120, 60]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();

        // A 50x50 input is resized to the recorded 32x32, not a default
        let result = predictor.predict_bytes(&bytes).unwrap();
        assert!(result.confidence > 0.0);
    }
}
