// ============================================================
// Layer 5 — MobileNetV2 Feature Extractor
// ============================================================
// The pretrained backbone the classifier is built on. Only the
// convolutional trunk is implemented (no ImageNet classifier):
//
//   stem    : 3×3 conv, 3 → 32, stride 2       + BN + ReLU6
//   blocks  : 17 inverted residual blocks      (table below)
//   last    : 1×1 conv, 320 → 1280             + BN + ReLU6
//
// Inverted residual block (expand ratio t, stride s):
//   1×1 conv  C → tC   + BN + ReLU6     (skipped when t = 1)
//   3×3 depthwise conv, stride s  + BN + ReLU6
//   1×1 conv  tC → C'  + BN             (linear bottleneck)
//   + input, when the shapes match (s = 1 and C = C')
//
// Output for a 128×128 input: [batch, 1280, 4, 4].
//
// Field names mirror torchvision's `mobilenet_v2` layout so its
// ImageNet state dict can be loaded with a handful of key
// remaps (see infra::backbone_weights).
//
// Reference: Sandler et al. (2018) MobileNetV2
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    prelude::*,
};

/// Channels produced by the last 1×1 conv
pub const FEATURE_CHANNELS: usize = 1280;

const STEM_CHANNELS: usize = 32;

/// (expand ratio, output channels, repeats, stride of first repeat)
const BLOCK_SETTINGS: [(usize, usize, usize, usize); 7] = [
    (1, 16,  1, 1),
    (6, 24,  2, 2),
    (6, 32,  3, 2),
    (6, 64,  4, 2),
    (6, 96,  3, 1),
    (6, 160, 3, 2),
    (6, 320, 1, 1),
];

#[derive(Config, Debug)]
pub struct MobileNetV2Config {
    /// BatchNorm epsilon (torchvision uses 1e-5)
    #[config(default = 1e-5)]
    pub norm_epsilon: f64,
}

impl MobileNetV2Config {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MobileNetV2<B> {
        let eps = self.norm_epsilon;

        let stem = ConvBnRelu6::new(3, STEM_CHANNELS, 3, 2, 1, eps, device);

        let mut blocks   = Vec::new();
        let mut channels = STEM_CHANNELS;
        for &(expand, out, repeats, first_stride) in BLOCK_SETTINGS.iter() {
            for i in 0..repeats {
                let stride = if i == 0 { first_stride } else { 1 };
                blocks.push(InvertedResidual::new(channels, out, stride, expand, eps, device));
                channels = out;
            }
        }

        let last = ConvBnRelu6::new(channels, FEATURE_CHANNELS, 1, 1, 1, eps, device);

        MobileNetV2 { stem, blocks, last }
    }
}

// ─── Conv + BatchNorm (+ ReLU6) ───────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ConvBnRelu6<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: BatchNorm<B>,
}

impl<B: Backend> ConvBnRelu6<B> {
    /// `groups` = 1 for a regular conv, = channels for depthwise
    fn new(
        in_channels:  usize,
        out_channels: usize,
        kernel:       usize,
        stride:       usize,
        groups:       usize,
        eps:          f64,
        device:       &B::Device,
    ) -> Self {
        Self {
            conv: conv(in_channels, out_channels, kernel, stride, groups, device),
            norm: BatchNormConfig::new(out_channels).with_epsilon(eps).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.norm.forward(self.conv.forward(x));
        x.clamp(0.0, 6.0)
    }

    fn running_stat_count(&self) -> usize {
        norm_running_stats(&self.norm)
    }
}

#[derive(Module, Debug)]
pub struct ConvBn<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: BatchNorm<B>,
}

impl<B: Backend> ConvBn<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.norm.forward(self.conv.forward(x))
    }
}

/// running_mean + running_var, one value each per channel
fn norm_running_stats<B: Backend>(norm: &BatchNorm<B>) -> usize {
    2 * norm.gamma.val().dims()[0]
}

/// Bias-free conv with "same" padding for odd kernels
fn conv<B: Backend>(
    in_channels:  usize,
    out_channels: usize,
    kernel:       usize,
    stride:       usize,
    groups:       usize,
    device:       &B::Device,
) -> Conv2d<B> {
    let pad = (kernel - 1) / 2;
    Conv2dConfig::new([in_channels, out_channels], [kernel, kernel])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(pad, pad))
        .with_groups(groups)
        .with_bias(false)
        .init(device)
}

// ─── Inverted Residual Block ──────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct InvertedResidual<B: Backend> {
    pub expand:    Option<ConvBnRelu6<B>>,
    pub depthwise: ConvBnRelu6<B>,
    pub project:   ConvBn<B>,
}

impl<B: Backend> InvertedResidual<B> {
    fn new(
        in_channels:  usize,
        out_channels: usize,
        stride:       usize,
        expand_ratio: usize,
        eps:          f64,
        device:       &B::Device,
    ) -> Self {
        let hidden = in_channels * expand_ratio;

        let expand = (expand_ratio != 1)
            .then(|| ConvBnRelu6::new(in_channels, hidden, 1, 1, 1, eps, device));
        let depthwise = ConvBnRelu6::new(hidden, hidden, 3, stride, hidden, eps, device);
        let project = ConvBn {
            conv: conv(hidden, out_channels, 1, 1, 1, device),
            norm: BatchNormConfig::new(out_channels).with_epsilon(eps).init(device),
        };

        Self { expand, depthwise, project }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = match &self.expand {
            Some(expand) => expand.forward(input.clone()),
            None         => input.clone(),
        };
        let x = self.depthwise.forward(x);
        let x = self.project.forward(x);

        // Residual only when stride is 1 and channel count is unchanged
        if x.dims() == input.dims() {
            x + input
        } else {
            x
        }
    }

    fn running_stat_count(&self) -> usize {
        self.expand.as_ref().map_or(0, ConvBnRelu6::running_stat_count)
            + self.depthwise.running_stat_count()
            + norm_running_stats(&self.project.norm)
    }
}

// ─── Trunk ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct MobileNetV2<B: Backend> {
    pub stem:   ConvBnRelu6<B>,
    pub blocks: Vec<InvertedResidual<B>>,
    pub last:   ConvBnRelu6<B>,
}

impl<B: Backend> MobileNetV2<B> {
    /// images: [batch, 3, H, W] → features: [batch, 1280, H/32, W/32]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.stem.forward(images);
        for block in &self.blocks {
            x = block.forward(x);
        }
        self.last.forward(x)
    }

    /// BatchNorm running statistics. Burn's `num_params()` includes
    /// them even though they are buffers, not learnable weights.
    pub fn running_stat_count(&self) -> usize {
        self.stem.running_stat_count()
            + self.blocks.iter().map(InvertedResidual::running_stat_count).sum::<usize>()
            + self.last.running_stat_count()
    }

    /// Learnable weights only (conv kernels, BatchNorm gamma and beta)
    pub fn weight_count(&self) -> usize {
        self.num_params() - self.running_stat_count()
    }
}
