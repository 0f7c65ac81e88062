// ============================================================
// Layer 5 — Season Classifier Model
// ============================================================
// Transfer-learning classifier: a frozen MobileNetV2 trunk with
// a small trainable head on top.
//
// Architecture:
//
//   Input: images [batch, S, S, 3]  (NHWC, values in [0, 1])
//       │
//       ▼ permute → [batch, 3, S, S]
//   MobileNetV2 trunk (frozen)      → [batch, 1280, S/32, S/32]
//       │
//       ▼
//   Global average pooling          → [batch, 1280]
//       │
//       ▼
//   Linear 1280 → 12 + ReLU         → [batch, 12]
//       │
//       ▼
//   Linear 12 → N                   → [batch, N] logits
//       │
//       ▼ softmax (predict_proba only)
//   class probabilities, each row sums to 1
//
// The trunk and the head are separate modules so the trainer can
// keep the trunk on the inner (non-autodiff) backend: it then runs
// BatchNorm with its running statistics and never receives a
// gradient, which is what "frozen" means here.
//
// Reference: Burn Book §3 (Building Blocks)
//            Howard & Sandler, MobileNetV2 transfer learning

use burn::{
    nn::{
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Linear, LinearConfig, Relu,
    },
    prelude::*,
    tensor::activation::softmax,
};

use crate::ml::backbone::{MobileNetV2, MobileNetV2Config, FEATURE_CHANNELS};

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct SeasonClassifierConfig {
    /// Number of season classes (N)
    pub num_classes: usize,

    /// Width of the hidden dense layer
    #[config(default = 12)]
    pub hidden_units: usize,

    /// Side length S of the square input images
    #[config(default = 128)]
    pub image_size: usize,
}

impl SeasonClassifierConfig {
    /// Fresh trunk (random weights) plus a fresh head
    pub fn init<B: Backend>(&self, device: &B::Device) -> SeasonClassifier<B> {
        SeasonClassifier {
            backbone: MobileNetV2Config::new().init(device),
            head:     self.init_head(device),
        }
    }

    pub fn init_head<B: Backend>(&self, device: &B::Device) -> ClassifierHead<B> {
        ClassifierHead {
            pool:       AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            hidden:     LinearConfig::new(FEATURE_CHANNELS, self.hidden_units).init(device),
            activation: Relu::new(),
            output:     LinearConfig::new(self.hidden_units, self.num_classes).init(device),
        }
    }
}

// ─── Trainable Head ───────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ClassifierHead<B: Backend> {
    pool:       AdaptiveAvgPool2d,
    hidden:     Linear<B>,
    activation: Relu,
    output:     Linear<B>,
}

impl<B: Backend> ClassifierHead<B> {
    /// features: [batch, 1280, h, w] → logits: [batch, num_classes]
    pub fn forward(&self, features: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch, channels, _, _] = features.dims();

        let pooled = self.pool.forward(features).reshape([batch, channels]);
        let hidden = self.activation.forward(self.hidden.forward(pooled));
        self.output.forward(hidden)
    }
}

// ─── Full Classifier ──────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SeasonClassifier<B: Backend> {
    pub backbone: MobileNetV2<B>,
    pub head:     ClassifierHead<B>,
}

impl<B: Backend> SeasonClassifier<B> {
    pub fn from_parts(backbone: MobileNetV2<B>, head: ClassifierHead<B>) -> Self {
        Self { backbone, head }
    }

    /// images: [batch, S, S, 3] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.forward(to_channels_first(images));
        self.head.forward(features)
    }

    /// Per-class probabilities (softmax over the logits)
    pub fn predict_proba(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(images), 1)
    }
}

/// NHWC → NCHW, the layout Burn's conv layers expect
pub fn to_channels_first<B: Backend>(images: Tensor<B, 4>) -> Tensor<B, 4> {
    images.permute([0, 3, 1, 2])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_head_output_shape() {
        let device = Default::default();
        let head: ClassifierHead<TestBackend> = SeasonClassifierConfig::new(4).init_head(&device);
        let features = Tensor::<TestBackend, 4>::ones([3, FEATURE_CHANNELS, 2, 2], &device);
        assert_eq!(head.forward(features).dims(), [3, 4]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let device = Default::default();
        let cfg    = SeasonClassifierConfig::new(4).with_image_size(32);
        let model: SeasonClassifier<TestBackend> = cfg.init(&device);

        let images = Tensor::<TestBackend, 4>::random(
            [2, 32, 32, 3],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let probs = model.predict_proba(images);
        assert_eq!(probs.dims(), [2, 4]);

        let rows: Vec<f32> = probs.sum_dim(1).into_data().convert::<f32>().to_vec().unwrap();
        for total in rows {
            assert!((total - 1.0).abs() < 1e-5, "row sums to {total}");
        }
    }

    #[test]
    fn test_head_is_small() {
        let device = Default::default();
        let head: ClassifierHead<TestBackend> = SeasonClassifierConfig::new(4).init_head(&device);
        // (1280*12 + 12) + (12*4 + 4)
        assert_eq!(head.num_params(), 15_372 + 52);
    }
}
