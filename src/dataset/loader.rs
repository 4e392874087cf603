//! Dataset Loader
//!
//! Scans a labeled directory tree and maps the known class-directory names to
//! binary edible/poisonous labels. Directories with unrecognized names are
//! skipped so a mixed dataset root stays usable.

use std::path::{Path, PathBuf};

use image::{imageops::FilterType, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{MushroomError, Result};

/// Binary class label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassLabel {
    Edible = 0,
    Poisonous = 1,
}

impl ClassLabel {
    /// Integer label used as the classification target
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ClassLabel::Edible => "edible",
            ClassLabel::Poisonous => "poisonous",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ClassLabel::Edible),
            1 => Some(ClassLabel::Poisonous),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The fixed mapping from dataset directory names to labels
pub const CLASS_DIRECTORIES: [(&str, ClassLabel); 4] = [
    ("edible mushroom sporocarp", ClassLabel::Edible),
    ("edible sporocarp", ClassLabel::Edible),
    ("poisonous mushroom sporocarp", ClassLabel::Poisonous),
    ("poisonous sporocarp", ClassLabel::Poisonous),
];

/// Image file extensions accepted by the scan (matched case-insensitively)
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Look up the label for a dataset directory name, `None` if unrecognized
pub fn label_for_directory(name: &str) -> Option<ClassLabel> {
    CLASS_DIRECTORIES
        .iter()
        .find(|(dir, _)| *dir == name)
        .map(|(_, label)| *label)
}

/// A single image sample with its label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Binary class label
    pub label: ClassLabel,
}

/// Scan the immediate subdirectories of `root` for labeled image samples
///
/// The directory should be structured as:
/// ```text
/// root/
/// ├── edible sporocarp/
/// │   ├── image1.jpg
/// │   └── image2.png
/// └── poisonous sporocarp/
///     └── ...
/// ```
///
/// Only subdirectories whose names exactly match one of [`CLASS_DIRECTORIES`]
/// contribute samples; everything else is skipped. No shuffling happens here.
pub fn scan_dataset<P: AsRef<Path>>(root: P) -> Result<Vec<ImageSample>> {
    let root = root.as_ref();
    info!("Scanning dataset directory: {:?}", root);

    if !root.exists() {
        return Err(MushroomError::Dataset(format!(
            "dataset directory does not exist: {}",
            root.display()
        )));
    }

    let mut samples = Vec::new();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let dir_name = entry.file_name();
        let Some(dir_name) = dir_name.to_str() else {
            continue;
        };

        let Some(label) = label_for_directory(dir_name) else {
            debug!("Skipping unrecognized class directory '{}'", dir_name);
            continue;
        };

        let mut class_count = 0usize;
        for file in WalkDir::new(entry.path())
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = file.path().to_path_buf();
            if is_image_file(&path) {
                samples.push(ImageSample { path, label });
                class_count += 1;
            }
        }

        debug!(
            "Class directory '{}' ({}): {} images",
            dir_name, label, class_count
        );
    }

    info!("Found {} labeled samples", samples.len());
    Ok(samples)
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Load an image from disk, forced to RGB and resized to `size` x `size`
pub fn load_rgb(path: &Path, size: usize) -> Result<RgbImage> {
    let img = ImageReader::open(path)
        .map_err(|e| MushroomError::InvalidImage(format!("{}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| MushroomError::InvalidImage(format!("{}: {}", path.display(), e)))?;

    let resized = img.resize_exact(size as u32, size as u32, FilterType::Triangle);
    Ok(resized.to_rgb8())
}

/// Convert an RGB image to CHW float data scaled to [0, 1]
pub fn to_chw(rgb: &RgbImage) -> Vec<f32> {
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let mut data = vec![0.0f32; 3 * height * width];

    for y in 0..height {
        for x in 0..width {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            data[y * width + x] = pixel[0] as f32 / 255.0;
            data[height * width + y * width + x] = pixel[1] as f32 / 255.0;
            data[2 * height * width + y * width + x] = pixel[2] as f32 / 255.0;
        }
    }

    data
}

/// Per-class sample counts for a scanned dataset
pub fn class_counts(samples: &[ImageSample]) -> [usize; crate::NUM_CLASSES] {
    let mut counts = [0usize; crate::NUM_CLASSES];
    for sample in samples {
        counts[sample.label.index()] += 1;
    }
    counts
}
