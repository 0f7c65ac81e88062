// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer holds the network, the training loop and the
// inference engine. The data layer only produces Burn datasets
// and batches; everything that builds or runs a model is here.
//
// What's in this layer:
//
//   backbone.rs   — MobileNetV2 convolutional trunk
//                   • inverted residual blocks
//                   • depthwise separable convolutions
//                   • BatchNorm + ReLU6
//                   Laid out like torchvision so ImageNet
//                   weights can be loaded into it
//
//   model.rs      — Season classifier
//                   Frozen trunk + pooling + 12-unit dense
//                   layer + N-way output, softmax for
//                   probabilities
//
//   trainer.rs    — The training loop
//                   Forward pass, cross-entropy loss, Adam
//                   step on the head only, validation metrics
//                   per epoch
//
//   inferencer.rs — The inference engine
//                   Loads a saved artifact, preprocesses a
//                   frame exactly like training, returns a
//                   Prediction
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Sandler et al. (2018) MobileNetV2

/// Backend used for training (GPU with autodiff)
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend used for inference and for the frozen trunk
pub type InferBackend = burn::backend::Wgpu;

/// MobileNetV2 feature extractor
pub mod backbone;

/// Classifier head and the full model
pub mod model;

/// Training loop with per-epoch validation
pub mod trainer;

/// Inference engine: loads an artifact and classifies images
pub mod inferencer;
