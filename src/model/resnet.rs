//! Transfer-learning ResNet-18 Architecture
//!
//! An 18-layer residual backbone with the stem and the first three stages
//! frozen; only the final residual stage and the custom classifier head stay
//! trainable. The single-output head of the reference topology is replaced
//! with dropout(0.5) -> 512 -> ReLU -> dropout(0.3) -> 128 -> ReLU ->
//! dropout(0.2) -> num_classes.
//!
//! No pretrained-weight import exists here; the unfrozen stages train from
//! initialization and snapshots record this architecture by name.

use burn::module::Module;
use burn::nn::{
    conv::{Conv2d, Conv2dConfig},
    pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
    Relu,
};
use burn::prelude::*;

use crate::model::ImageClassifier;

/// 1x1 projection used when a residual block changes resolution or width
#[derive(Module, Debug)]
struct Downsample<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
}

impl<B: Backend> Downsample<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device),
            norm: BatchNormConfig::new(out_channels).init(device),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.norm.forward(self.conv.forward(input))
    }
}

/// Standard two-convolution residual block
#[derive(Module, Debug)]
struct BasicBlock<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    norm2: BatchNorm<B, 2>,
    downsample: Option<Downsample<B>>,
    activation: Relu,
}

impl<B: Backend> BasicBlock<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let downsample = if stride != 1 || in_channels != out_channels {
            Some(Downsample::new(in_channels, out_channels, stride, device))
        } else {
            None
        };

        Self {
            conv1: Conv2dConfig::new([in_channels, out_channels], [3, 3])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(false)
                .init(device),
            norm1: BatchNormConfig::new(out_channels).init(device),
            conv2: Conv2dConfig::new([out_channels, out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(false)
                .init(device),
            norm2: BatchNormConfig::new(out_channels).init(device),
            downsample,
            activation: Relu::new(),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(input.clone()),
            None => input.clone(),
        };

        let x = self.conv1.forward(input);
        let x = self.norm1.forward(x);
        let x = self.activation.forward(x);
        let x = self.conv2.forward(x);
        let x = self.norm2.forward(x);

        self.activation.forward(x + identity)
    }
}

/// One residual stage of two basic blocks
#[derive(Module, Debug)]
struct Stage<B: Backend> {
    block1: BasicBlock<B>,
    block2: BasicBlock<B>,
}

impl<B: Backend> Stage<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        Self {
            block1: BasicBlock::new(in_channels, out_channels, stride, device),
            block2: BasicBlock::new(out_channels, out_channels, 1, device),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.block2.forward(self.block1.forward(input))
    }
}

/// Configuration for [`TransferResNet`]
#[derive(Config, Debug)]
pub struct TransferResNetConfig {
    #[config(default = 2)]
    pub num_classes: usize,
}

impl TransferResNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransferResNet<B> {
        // Frozen feature extractor: stem plus the first three stages
        let conv1 = Conv2dConfig::new([3, 64], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device)
            .no_grad();
        let norm1 = BatchNormConfig::new(64).init(device).no_grad();
        let layer1 = Stage::new(64, 64, 1, device).no_grad();
        let layer2 = Stage::new(64, 128, 2, device).no_grad();
        let layer3 = Stage::new(128, 256, 2, device).no_grad();

        // Trainable: the final stage and the classifier head
        let layer4 = Stage::new(256, 512, 2, device);

        TransferResNet {
            conv1,
            norm1,
            maxpool: MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(),
            layer1,
            layer2,
            layer3,
            layer4,
            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head_dropout1: DropoutConfig::new(0.5).init(),
            head_fc1: LinearConfig::new(512, 512).init(device),
            head_dropout2: DropoutConfig::new(0.3).init(),
            head_fc2: LinearConfig::new(512, 128).init(device),
            head_dropout3: DropoutConfig::new(0.2).init(),
            head_fc3: LinearConfig::new(128, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

/// ResNet-18 backbone with a small trainable classifier head
#[derive(Module, Debug)]
pub struct TransferResNet<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B, 2>,
    maxpool: MaxPool2d,
    layer1: Stage<B>,
    layer2: Stage<B>,
    layer3: Stage<B>,
    layer4: Stage<B>,
    avgpool: AdaptiveAvgPool2d,
    head_dropout1: Dropout,
    head_fc1: Linear<B>,
    head_dropout2: Dropout,
    head_fc2: Linear<B>,
    head_dropout3: Dropout,
    head_fc3: Linear<B>,
    activation: Relu,
}

impl<B: Backend> TransferResNet<B> {
    /// Forward pass returning logits `[batch, num_classes]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(images);
        let x = self.norm1.forward(x);
        let x = self.activation.forward(x);
        let x = self.maxpool.forward(x);

        let x = self.layer1.forward(x);
        let x = self.layer2.forward(x);
        let x = self.layer3.forward(x);
        let x = self.layer4.forward(x);

        let x = self.avgpool.forward(x);
        let x = x.flatten::<2>(1, 3);

        let x = self.head_dropout1.forward(x);
        let x = self.head_fc1.forward(x);
        let x = self.activation.forward(x);
        let x = self.head_dropout2.forward(x);
        let x = self.head_fc2.forward(x);
        let x = self.activation.forward(x);
        let x = self.head_dropout3.forward(x);
        self.head_fc3.forward(x)
    }
}

impl<B: Backend> ImageClassifier<B> for TransferResNet<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        TransferResNet::forward(self, images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    #[test]
    fn test_forward_output_shape() {
        let device = Default::default();
        let model: TransferResNet<DefaultBackend> = TransferResNetConfig::new().init(&device);

        let input = Tensor::<DefaultBackend, 4>::zeros([1, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [1, 2]);
    }

    #[test]
    fn test_adaptive_pool_handles_other_resolutions() {
        let device = Default::default();
        let model: TransferResNet<DefaultBackend> = TransferResNetConfig::new().init(&device);

        let input = Tensor::<DefaultBackend, 4>::zeros([2, 3, 96, 96], &device);
        assert_eq!(model.forward(input).dims(), [2, 2]);
    }
}
