//! From-scratch CNN Architecture
//!
//! Four convolutional blocks (3 -> 32 -> 64 -> 128 -> 256 channels, each with
//! batch norm, ReLU, and 2x2 max pooling) followed by a three-layer fully
//! connected head. With 256x256 input the flattened feature vector is
//! 256 * 16 * 16 = 65536.
//!
//! Dropout sits between the hidden linear layers. Burn disables dropout
//! automatically on non-autodiff backends, so inference is deterministic with
//! the same parameter set that was trained.

use burn::nn::{
    conv::{Conv2d, Conv2dConfig},
    pool::{MaxPool2d, MaxPool2dConfig},
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
    Relu,
};
use burn::prelude::*;
use burn::tensor::activation::softmax;

use crate::model::ImageClassifier;

/// One convolutional block: conv 3x3 (same padding), batch norm, ReLU, 2x2 max pool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    activation: Relu,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            norm: BatchNormConfig::new(out_channels).init(device),
            activation: Relu::new(),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(input);
        let x = self.norm.forward(x);
        let x = self.activation.forward(x);
        self.pool.forward(x)
    }
}

/// Configuration for [`MushroomCnn`]
///
/// `image_size` must be divisible by 16 (four pooling halvings).
#[derive(Config, Debug)]
pub struct MushroomCnnConfig {
    #[config(default = 2)]
    pub num_classes: usize,
    #[config(default = 256)]
    pub image_size: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl MushroomCnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MushroomCnn<B> {
        let feature_size = self.image_size / 16;
        let flat_features = 256 * feature_size * feature_size;

        MushroomCnn {
            block1: ConvBlock::new(3, 32, device),
            block2: ConvBlock::new(32, 64, device),
            block3: ConvBlock::new(64, 128, device),
            block4: ConvBlock::new(128, 256, device),
            fc1: LinearConfig::new(flat_features, 512).init(device),
            fc2: LinearConfig::new(512, 128).init(device),
            fc3: LinearConfig::new(128, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            activation: Relu::new(),
        }
    }
}

/// The from-scratch convolutional classifier
#[derive(Module, Debug)]
pub struct MushroomCnn<B: Backend> {
    block1: ConvBlock<B>,
    block2: ConvBlock<B>,
    block3: ConvBlock<B>,
    block4: ConvBlock<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    dropout: Dropout,
    activation: Relu,
}

impl<B: Backend> MushroomCnn<B> {
    /// Forward pass returning logits `[batch, num_classes]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.block1.forward(images);
        let x = self.block2.forward(x);
        let x = self.block3.forward(x);
        let x = self.block4.forward(x);

        let x = x.flatten::<2>(1, 3);

        let x = self.fc1.forward(x);
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);

        let x = self.fc2.forward(x);
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);

        self.fc3.forward(x)
    }

    /// Forward pass returning class probabilities
    pub fn forward_softmax(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(images), 1)
    }
}

impl<B: Backend> ImageClassifier<B> for MushroomCnn<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        MushroomCnn::forward(self, images)
    }
}
