//! Dataset handling: directory scanning, stratified splits, batching, and
//! training-time augmentation.

pub mod augmentation;
pub mod batcher;
pub mod loader;
pub mod split;

pub use augmentation::{AugmentationConfig, Augmenter};
pub use batcher::{MushroomBatch, MushroomBatcher, MushroomItem, Normalizer};
pub use loader::{
    class_counts, label_for_directory, scan_dataset, ClassLabel, ImageSample, CLASS_DIRECTORIES,
};
pub use split::{DatasetSplits, SplitConfig};
