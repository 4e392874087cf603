//! Dataset Splitting
//!
//! Stratified train/validation/test partitioning with a fixed seed so runs are
//! reproducible. The split mirrors a 70/30 split followed by a 50/50 split of
//! the holdout, giving 70/15/15 overall while preserving class ratios.

use std::collections::HashMap;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::loader::{ClassLabel, ImageSample};
use crate::utils::error::{MushroomError, Result};

/// Configuration for dataset splitting
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Fraction of samples assigned to the training partition
    pub train_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            train_ratio: 0.7,
        }
    }
}

/// Train/validation/test partitions of the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSplits {
    pub train: Vec<ImageSample>,
    pub validation: Vec<ImageSample>,
    pub test: Vec<ImageSample>,
}

impl DatasetSplits {
    /// Partition `samples` into stratified train/validation/test sets
    ///
    /// Samples are grouped by class, each group is shuffled with the seeded
    /// RNG, then `train_ratio` of the group goes to train and the remainder is
    /// halved between validation and test.
    pub fn stratified(samples: &[ImageSample], config: &SplitConfig) -> Result<Self> {
        if samples.is_empty() {
            return Err(MushroomError::Dataset(
                "cannot split an empty dataset".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&config.train_ratio) {
            return Err(MushroomError::Config(format!(
                "train_ratio must be in (0, 1), got {}",
                config.train_ratio
            )));
        }

        let mut by_class: HashMap<ClassLabel, Vec<ImageSample>> = HashMap::new();
        for sample in samples {
            by_class.entry(sample.label).or_default().push(sample.clone());
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut splits = DatasetSplits {
            train: Vec::new(),
            validation: Vec::new(),
            test: Vec::new(),
        };

        // Deterministic class order so the seed fully determines the result
        let mut classes: Vec<ClassLabel> = by_class.keys().copied().collect();
        classes.sort_by_key(|label| label.index());

        for label in classes {
            let mut group = by_class.remove(&label).unwrap_or_default();
            group.shuffle(&mut rng);

            let n_train = (group.len() as f64 * config.train_ratio).round() as usize;
            let holdout = group.split_off(n_train.min(group.len()));
            splits.train.extend(group);

            let n_val = holdout.len() / 2;
            splits.validation.extend(holdout[..n_val].iter().cloned());
            splits.test.extend(holdout[n_val..].iter().cloned());
        }

        info!(
            "Split {} samples into {} train / {} validation / {} test",
            samples.len(),
            splits.train.len(),
            splits.validation.len(),
            splits.test.len()
        );

        Ok(splits)
    }

    /// Save the split manifest as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved split manifest
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_samples(edible: usize, poisonous: usize) -> Vec<ImageSample> {
        let mut samples = Vec::new();
        for i in 0..edible {
            samples.push(ImageSample {
                path: PathBuf::from(format!("edible_{i}.jpg")),
                label: ClassLabel::Edible,
            });
        }
        for i in 0..poisonous {
            samples.push(ImageSample {
                path: PathBuf::from(format!("poisonous_{i}.jpg")),
                label: ClassLabel::Poisonous,
            });
        }
        samples
    }

    fn count_label(samples: &[ImageSample], label: ClassLabel) -> usize {
        samples.iter().filter(|s| s.label == label).count()
    }

    #[test]
    fn test_split_proportions() {
        let samples = make_samples(100, 100);
        let splits = DatasetSplits::stratified(&samples, &SplitConfig::default()).unwrap();

        assert_eq!(splits.total(), 200);
        assert_eq!(splits.train.len(), 140);
        assert_eq!(splits.validation.len(), 30);
        assert_eq!(splits.test.len(), 30);
    }

    #[test]
    fn test_split_is_stratified() {
        let samples = make_samples(100, 60);
        let splits = DatasetSplits::stratified(&samples, &SplitConfig::default()).unwrap();

        // Per-class counts follow the 70/15/15 policy class by class
        assert_eq!(count_label(&splits.train, ClassLabel::Edible), 70);
        assert_eq!(count_label(&splits.train, ClassLabel::Poisonous), 42);
        assert_eq!(count_label(&splits.validation, ClassLabel::Edible), 15);
        assert_eq!(count_label(&splits.validation, ClassLabel::Poisonous), 9);
    }

    #[test]
    fn test_split_reproducible() {
        let samples = make_samples(50, 50);
        let config = SplitConfig::default();

        let a = DatasetSplits::stratified(&samples, &config).unwrap();
        let b = DatasetSplits::stratified(&samples, &config).unwrap();

        let paths = |split: &[ImageSample]| -> Vec<PathBuf> {
            split.iter().map(|s| s.path.clone()).collect()
        };
        assert_eq!(paths(&a.train), paths(&b.train));
        assert_eq!(paths(&a.validation), paths(&b.validation));
        assert_eq!(paths(&a.test), paths(&b.test));
    }

    #[test]
    fn test_different_seed_changes_split() {
        let samples = make_samples(50, 50);
        let a = DatasetSplits::stratified(&samples, &SplitConfig::default()).unwrap();
        let b = DatasetSplits::stratified(
            &samples,
            &SplitConfig {
                seed: 7,
                ..Default::default()
            },
        )
        .unwrap();

        let a_paths: Vec<_> = a.train.iter().map(|s| &s.path).collect();
        let b_paths: Vec<_> = b.train.iter().map(|s| &s.path).collect();
        assert_ne!(a_paths, b_paths);
    }

    #[test]
    fn test_empty_dataset_is_error() {
        let result = DatasetSplits::stratified(&[], &SplitConfig::default());
        assert!(matches!(result, Err(MushroomError::Dataset(_))));
    }

    #[test]
    fn test_manifest_roundtrip() {
        let samples = make_samples(10, 10);
        let splits = DatasetSplits::stratified(&samples, &SplitConfig::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splits.json");
        splits.save(&path).unwrap();

        let loaded = DatasetSplits::load(&path).unwrap();
        assert_eq!(loaded.train.len(), splits.train.len());
        assert_eq!(loaded.test.len(), splits.test.len());
    }
}
