//! Parameter Snapshot Persistence
//!
//! Weights are saved with Burn's `CompactRecorder` (a `.mpk` file). A JSON
//! metadata sidecar (`<stem>.meta.json`) records the architecture, the image
//! size the model was trained with, and the class count, so inference never
//! has to guess how a snapshot was produced.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::*;
use burn::record::CompactRecorder;
use serde::{Deserialize, Serialize};

use crate::utils::error::{MushroomError, Result};

/// Current snapshot metadata format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// The two supported classifier architectures
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    #[default]
    Cnn,
    Resnet18,
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::Cnn => write!(f, "cnn"),
            Architecture::Resnet18 => write!(f, "resnet18"),
        }
    }
}

/// Versioned metadata stored beside the weight file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub format_version: u32,
    pub architecture: Architecture,
    pub image_size: usize,
    pub num_classes: usize,
}

impl SnapshotMeta {
    pub fn new(architecture: Architecture, image_size: usize, num_classes: usize) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            architecture,
            image_size,
            num_classes,
        }
    }
}

/// Strip a trailing `.mpk` so callers may pass either the stem or the file
pub fn snapshot_stem(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("mpk") => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

/// Path of the weight file for a snapshot stem
pub fn weights_path(stem: &Path) -> PathBuf {
    stem.with_extension("mpk")
}

/// Path of the metadata sidecar for a snapshot stem
pub fn meta_path(stem: &Path) -> PathBuf {
    stem.with_extension("meta.json")
}

/// Save model weights and the metadata sidecar
pub fn save_snapshot<B: Backend, M: Module<B>>(
    model: M,
    meta: &SnapshotMeta,
    stem: &Path,
) -> Result<()> {
    if let Some(parent) = stem.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    model
        .save_file(stem.to_path_buf(), &CompactRecorder::new())
        .map_err(|e| MushroomError::Serialization(format!("failed to save weights: {e}")))?;

    let json = serde_json::to_string_pretty(meta)?;
    std::fs::write(meta_path(stem), json)?;
    Ok(())
}

/// Load the metadata sidecar for a snapshot stem
pub fn load_meta(stem: &Path) -> Result<SnapshotMeta> {
    let path = meta_path(stem);
    if !path.exists() {
        return Err(MushroomError::Config(format!(
            "snapshot metadata not found: {}",
            path.display()
        )));
    }

    let json = std::fs::read_to_string(&path)?;
    let meta: SnapshotMeta = serde_json::from_str(&json)?;

    if meta.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(MushroomError::Config(format!(
            "unsupported snapshot format version {} (expected {})",
            meta.format_version, SNAPSHOT_FORMAT_VERSION
        )));
    }

    Ok(meta)
}

/// Load weights from a snapshot stem into a freshly constructed module
///
/// A record whose layer set or shapes disagree with the module surfaces as an
/// [`MushroomError::ArchitectureMismatch`].
pub fn load_weights<B: Backend, M: Module<B>>(
    model: M,
    meta: &SnapshotMeta,
    stem: &Path,
    device: &B::Device,
) -> Result<M> {
    model
        .load_file(weights_path(stem), &CompactRecorder::new(), device)
        .map_err(|e| MushroomError::ArchitectureMismatch {
            architecture: meta.architecture.to_string(),
            detail: e.to_string(),
        })
}
