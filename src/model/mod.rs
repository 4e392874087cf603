//! Model architectures and snapshot persistence.

pub mod cnn;
pub mod resnet;
pub mod snapshot;

use burn::prelude::*;

pub use cnn::{MushroomCnn, MushroomCnnConfig};
pub use resnet::{TransferResNet, TransferResNetConfig};
pub use snapshot::{Architecture, SnapshotMeta, SNAPSHOT_FORMAT_VERSION};

/// Common interface of the two classifier architectures
///
/// Maps a batch of normalized images `[batch, 3, size, size]` to unnormalized
/// class scores `[batch, num_classes]`.
pub trait ImageClassifier<B: Backend> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}
