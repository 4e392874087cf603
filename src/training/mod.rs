//! Training: configuration, learning-rate scheduling, and the supervised loop.

pub mod scheduler;
pub mod trainer;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::AugmentationConfig;
use crate::model::Architecture;
use crate::utils::error::{MushroomError, Result};
use crate::DEFAULT_IMAGE_SIZE;

pub use scheduler::StepDecay;
pub use trainer::{train, EpochMetrics, TrainingHistory};

/// Configuration for a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Which architecture to train
    pub architecture: Architecture,
    /// Maximum number of epochs
    pub epochs: usize,
    /// Mini-batch size
    pub batch_size: usize,
    /// Base learning rate for the Adam optimizer
    pub learning_rate: f64,
    /// Seed for splits, shuffling, and augmentation
    pub seed: u64,
    /// Square resolution images are resized to (must be divisible by 16)
    pub image_size: usize,
    /// Learning-rate schedule
    pub scheduler: StepDecay,
    /// Stop once validation accuracy exceeds this threshold, if set
    pub early_stop_accuracy: Option<f64>,
    /// Training-time augmentation, `None` to disable
    pub augmentation: Option<AugmentationConfig>,
    /// Directory snapshots and the history file are written to
    pub artifact_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            architecture: Architecture::Cnn,
            epochs: 25,
            batch_size: 32,
            learning_rate: 1e-3,
            seed: 42,
            image_size: DEFAULT_IMAGE_SIZE,
            scheduler: StepDecay::classic(),
            early_stop_accuracy: Some(0.95),
            augmentation: Some(AugmentationConfig::default()),
            artifact_dir: PathBuf::from("models"),
        }
    }
}

impl TrainingConfig {
    /// Validate the configuration before starting a run
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(MushroomError::Config("epochs must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(MushroomError::Config("batch_size must be positive".into()));
        }
        if self.learning_rate <= 0.0 {
            return Err(MushroomError::Config(
                "learning_rate must be positive".into(),
            ));
        }
        if self.image_size == 0 || self.image_size % 16 != 0 {
            return Err(MushroomError::Config(format!(
                "image_size must be a positive multiple of 16, got {}",
                self.image_size
            )));
        }
        if let Some(target) = self.early_stop_accuracy {
            if !(0.0..=1.0).contains(&target) {
                return Err(MushroomError::Config(format!(
                    "early_stop_accuracy must be in [0, 1], got {target}"
                )));
            }
        }
        Ok(())
    }

    /// Snapshot stem inside the artifact directory, named by architecture
    pub fn snapshot_stem(&self) -> PathBuf {
        self.artifact_dir
            .join(format!("mushroom_{}", self.architecture))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_image_size_rejected() {
        let config = TrainingConfig {
            image_size: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MushroomError::Config(_))
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = TrainingConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_snapshot_stem_names_architecture() {
        let config = TrainingConfig::default();
        assert_eq!(
            config.snapshot_stem(),
            PathBuf::from("models/mushroom_cnn")
        );

        let config = TrainingConfig {
            architecture: Architecture::Resnet18,
            ..Default::default()
        };
        assert_eq!(
            config.snapshot_stem(),
            PathBuf::from("models/mushroom_resnet18")
        );
    }
}
