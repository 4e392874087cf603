//! Batching for Burn
//!
//! Stacks loaded image samples into `[batch, 3, size, size]` tensors and
//! applies ImageNet normalization on the target device. Items arrive with
//! pixel values already scaled to [0, 1] in CHW order.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use burn::tensor::ElementConversion;

use crate::dataset::loader::ClassLabel;
use crate::{IMAGENET_MEAN, IMAGENET_STD};

/// A single loaded training item
#[derive(Debug, Clone)]
pub struct MushroomItem {
    /// CHW pixel data in [0, 1], length `3 * size * size`
    pub image: Vec<f32>,
    /// Classification target
    pub label: ClassLabel,
}

/// A batch of images and integer targets
#[derive(Debug, Clone)]
pub struct MushroomBatch<B: Backend> {
    /// Normalized images, shape `[batch, 3, size, size]`
    pub images: Tensor<B, 4>,
    /// Class indices, shape `[batch]`
    pub targets: Tensor<B, 1, Int>,
}

/// ImageNet normalizer holding broadcastable mean/std tensors
#[derive(Debug, Clone)]
pub struct Normalizer<B: Backend> {
    mean: Tensor<B, 4>,
    std: Tensor<B, 4>,
}

impl<B: Backend> Normalizer<B> {
    pub fn new(device: &B::Device) -> Self {
        let mean = Tensor::<B, 1>::from_floats(IMAGENET_MEAN, device).reshape([1, 3, 1, 1]);
        let std = Tensor::<B, 1>::from_floats(IMAGENET_STD, device).reshape([1, 3, 1, 1]);
        Self { mean, std }
    }

    /// `(input - mean) / std`, input expected in [0, 1]
    pub fn normalize(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        (input - self.mean.clone()) / self.std.clone()
    }

    pub fn to_device(&self, device: &B::Device) -> Self {
        Self {
            mean: self.mean.clone().to_device(device),
            std: self.std.clone().to_device(device),
        }
    }
}

/// Batcher producing normalized image batches
#[derive(Debug, Clone)]
pub struct MushroomBatcher<B: Backend> {
    normalizer: Normalizer<B>,
    image_size: usize,
}

impl<B: Backend> MushroomBatcher<B> {
    pub fn new(device: &B::Device, image_size: usize) -> Self {
        Self {
            normalizer: Normalizer::new(device),
            image_size,
        }
    }

    pub fn image_size(&self) -> usize {
        self.image_size
    }
}

impl<B: Backend> Batcher<B, MushroomItem, MushroomBatch<B>> for MushroomBatcher<B> {
    fn batch(&self, items: Vec<MushroomItem>, device: &B::Device) -> MushroomBatch<B> {
        let size = self.image_size;

        let targets = items
            .iter()
            .map(|item| {
                Tensor::<B, 1, Int>::from_data(
                    TensorData::from([(item.label.index() as i64).elem::<B::IntElem>()]),
                    device,
                )
            })
            .collect();

        let images = items
            .into_iter()
            .map(|item| TensorData::new(item.image, Shape::new([3, size, size])))
            .map(|data| Tensor::<B, 3>::from_data(data.convert::<B::FloatElem>(), device))
            .collect();

        let images = Tensor::stack(images, 0);
        let targets = Tensor::cat(targets, 0);

        let images = self.normalizer.to_device(device).normalize(images);

        MushroomBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    fn item(value: f32, size: usize, label: ClassLabel) -> MushroomItem {
        MushroomItem {
            image: vec![value; 3 * size * size],
            label,
        }
    }

    #[test]
    fn test_batch_shape_and_targets() {
        let device = Default::default();
        let batcher = MushroomBatcher::<DefaultBackend>::new(&device, 8);

        let batch = batcher.batch(
            vec![
                item(0.5, 8, ClassLabel::Edible),
                item(0.2, 8, ClassLabel::Poisonous),
            ],
            &device,
        );

        assert_eq!(batch.images.dims(), [2, 3, 8, 8]);
        assert_eq!(batch.targets.dims(), [2]);

        let targets: Vec<i64> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![0, 1]);
    }

    #[test]
    fn test_batch_applies_imagenet_normalization() {
        let device = Default::default();
        let batcher = MushroomBatcher::<DefaultBackend>::new(&device, 4);

        let batch = batcher.batch(vec![item(0.5, 4, ClassLabel::Edible)], &device);
        let values: Vec<f32> = batch.images.into_data().to_vec().unwrap();

        for channel in 0..3 {
            let expected = (0.5 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel];
            let actual = values[channel * 16];
            assert!(
                (actual - expected).abs() < 1e-5,
                "channel {channel}: {actual} vs {expected}"
            );
        }
    }
}
