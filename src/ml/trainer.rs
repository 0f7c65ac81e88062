// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Trains the classifier head on top of the frozen trunk with
// Burn's DataLoader and Adam.
//
// How freezing works here:
//   - The trunk lives on TrainBackend::InnerBackend (Wgpu). It
//     never sees an autodiff graph, so no gradients reach it and
//     its BatchNorm layers always use their running statistics.
//   - Each batch arrives on the autodiff backend; images are
//     unwrapped with .inner(), pushed through the trunk, and the
//     features re-enter the graph with Tensor::from_inner.
//   - Only the head (Autodiff<Wgpu>) is handed to the optimiser.
//   - head.valid() gives the inner-backend copy for validation.
//   - argmax(1) returns [batch, 1] so we flatten before .equal()
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::ImageBatcher, dataset::SeasonDataset};
use crate::infra::{backbone_weights, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::{
    backbone::MobileNetV2,
    model::{to_channels_first, ClassifierHead, SeasonClassifier, SeasonClassifierConfig},
    InferBackend, TrainBackend,
};

/// What a finished run hands back to the caller
pub struct TrainingOutcome<B: Backend> {
    pub model:   SeasonClassifier<B>,
    pub config:  SeasonClassifierConfig,
    pub history: Vec<EpochMetrics>,
}

impl<B: Backend> TrainingOutcome<B> {
    pub fn final_metrics(&self) -> Option<&EpochMetrics> {
        self.history.last()
    }
}

pub fn run_training(
    cfg:         &TrainConfig,
    num_classes: usize,
    train:       SeasonDataset,
    val:         SeasonDataset,
    metrics:     &MetricsLogger,
) -> Result<TrainingOutcome<InferBackend>> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    let backbone = backbone_weights::load_backbone::<InferBackend>(cfg.backbone_init(), &device)?;

    train_loop::<TrainBackend>(cfg, num_classes, backbone, train, val, Some(metrics), &device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    num_classes:   usize,
    backbone:      MobileNetV2<B::InnerBackend>,
    train_dataset: SeasonDataset,
    val_dataset:   SeasonDataset,
    metrics:       Option<&MetricsLogger>,
    device:        &B::Device,
) -> Result<TrainingOutcome<B::InnerBackend>> {

    // ── Build head ────────────────────────────────────────────────────────────
    let model_cfg = SeasonClassifierConfig::new(num_classes)
        .with_hidden_units(cfg.hidden_units)
        .with_image_size(cfg.image_size);
    let mut head = model_cfg.init_head::<B>(device);

    let (trainable, frozen) = parameter_summary(&backbone, &head);
    tracing::info!(
        "Model ready: {} classes | total params={} | trainable={} | frozen={} (+{} BatchNorm running stats)",
        num_classes,
        frozen + trainable,
        trainable,
        frozen,
        backbone.running_stat_count(),
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim_cfg = AdamConfig::new().with_epsilon(1e-7);
    let mut optim = optim_cfg.init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    // Training order is reshuffled every epoch; validation order is fixed.
    let train_loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device.clone(), cfg.image_size))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    let val_loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device.clone(), cfg.image_size))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut history = Vec::with_capacity(cfg.epochs);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;
        let mut train_correct  = 0usize;
        let mut train_seen     = 0usize;

        for batch in train_loader.iter() {
            let features = backbone.forward(to_channels_first(batch.images.inner()));
            let features = Tensor::<B, 4>::from_inner(features);

            let logits = head.forward(features);
            let loss   = CrossEntropyLossConfig::new()
                .init(&logits.device())
                .forward(logits.clone(), batch.targets.clone());

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;
            train_seen     += batch.targets.dims()[0];
            train_correct  += count_correct(logits, batch.targets);

            // Backward pass + Adam update (head parameters only)
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &head);
            head = optim.step(cfg.lr, head, grads);
        }

        let train_loss = if train_batches > 0 { train_loss_sum / train_batches as f64 } else { f64::NAN };
        let train_acc  = if train_seen    > 0 { train_correct as f64 / train_seen as f64 } else { 0.0 };

        // ── Validation phase ──────────────────────────────────────────────────
        let head_valid = head.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut val_correct  = 0usize;
        let mut val_seen     = 0usize;

        for batch in val_loader.iter() {
            let targets  = batch.targets.inner();
            let features = backbone.forward(to_channels_first(batch.images.inner()));
            let logits   = head_valid.forward(features);

            let loss = CrossEntropyLossConfig::new()
                .init(&logits.device())
                .forward(logits.clone(), targets.clone());

            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;
            val_seen     += targets.dims()[0];
            val_correct  += count_correct(logits, targets);
        }

        let (val_loss, val_acc) = if val_batches > 0 {
            (Some(val_loss_sum / val_batches as f64), Some(val_correct as f64 / val_seen as f64))
        } else {
            (None, None)
        };

        let m = EpochMetrics::new(epoch, train_loss, train_acc, val_loss, val_acc);
        println!("Epoch {:>3}/{} | {}", epoch, cfg.epochs, m.summary());
        tracing::debug!(epoch, train_loss, train_acc, ?val_loss, ?val_acc, "epoch finished");

        if let Some(logger) = metrics {
            logger.log(&m)?;
        }
        history.push(m);
    }

    tracing::info!("Training complete!");
    Ok(TrainingOutcome {
        model:  SeasonClassifier::from_parts(backbone, head.valid()),
        config: model_cfg,
        history,
    })
}

/// (trainable, frozen) learnable weights. BatchNorm running stats are
/// left out of both.
fn parameter_summary<B: AutodiffBackend>(
    backbone: &MobileNetV2<B::InnerBackend>,
    head:     &ClassifierHead<B>,
) -> (usize, usize) {
    (head.num_params(), backbone.weight_count())
}

/// Number of rows whose argmax matches the target class
fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted.equal(targets).int().sum().into_scalar().elem::<i64>() as usize
}
