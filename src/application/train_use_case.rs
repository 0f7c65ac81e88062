// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate config, check the backbone weights exist
//   Step 2: Scan class folders + decode   (Layer 4 - data)
//   Step 3: Stratified train/val split    (Layer 4 - data)
//   Step 4: Open the metrics log          (Layer 6 - infra)
//   Step 5: Load backbone + run training  (Layer 5 - ml)
//   Step 6: Save the model artifact       (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    augment::AugmentConfig,
    pipeline::{prepare, PipelineConfig},
};
use crate::infra::{
    backbone_weights::BackboneInit,
    metrics::MetricsLogger,
    model_store::{ModelMetadata, ModelStore},
};
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it is stored inside the model artifact next to
// the weights it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:         String,
    pub model_path:       String,
    pub backbone_weights: String,
    pub random_backbone:  bool,
    pub metrics_dir:      String,
    pub image_size:       usize,
    pub batch_size:       usize,
    pub epochs:           usize,
    pub lr:               f64,
    pub validation_split: f64,
    pub hidden_units:     usize,
    pub seed:             u64,
    pub augment:          AugmentConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:         "data/seasons".to_string(),
            model_path:       "season_model.tar.gz".to_string(),
            backbone_weights: "weights/mobilenet_v2.pth".to_string(),
            random_backbone:  false,
            metrics_dir:      "runs".to_string(),
            image_size:       128,
            batch_size:       32,
            epochs:           10,
            lr:               1e-3,
            validation_split: 0.2,
            hidden_units:     12,
            seed:             42,
            augment:          AugmentConfig::default(),
        }
    }
}

impl TrainConfig {
    /// Reject settings that would fail halfway through a run
    pub fn validate(&self) -> Result<()> {
        ensure!(self.image_size >= 32, "image size must be at least 32 (got {})", self.image_size);
        ensure!(self.batch_size > 0, "batch size must be positive");
        ensure!(self.epochs > 0, "epochs must be positive");
        ensure!(self.lr > 0.0 && self.lr.is_finite(), "learning rate must be positive (got {})", self.lr);
        ensure!(
            (0.0..1.0).contains(&self.validation_split),
            "validation split must be in [0, 1) (got {})",
            self.validation_split
        );
        ensure!(self.hidden_units > 0, "hidden units must be positive");
        self.augment.validate()
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_dir:            PathBuf::from(&self.data_dir),
            image_size:          self.image_size as u32,
            validation_fraction: self.validation_split,
            augment:             self.augment.clone(),
            seed:                self.seed,
        }
    }

    /// `random_backbone` overrides the weights path
    pub fn backbone_init(&self) -> BackboneInit<'_> {
        if self.random_backbone {
            BackboneInit::Random
        } else {
            BackboneInit::Pretrained(Path::new(&self.backbone_weights))
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;
        tracing::debug!("Training configuration: {:?}", cfg);

        if let BackboneInit::Pretrained(weights) = cfg.backbone_init() {
            if !weights.exists() {
                bail!(
                    "Pretrained MobileNetV2 weights not found at '{}'. Pass --backbone-weights <file> \
                     (torchvision .pth or Burn .mpk), or --random-backbone to train on an untrained trunk",
                    weights.display()
                );
            }
        }

        // ── Steps 2-3: Load images and split ──────────────────────────────────
        // Class indices follow the alphabetical order of the folder names.
        tracing::info!("Loading images from '{}'", cfg.data_dir);
        let data = prepare(&cfg.pipeline_config())?;
        tracing::info!("Classes: {}", data.labels.names().join(", "));

        // ── Step 4: Metrics CSV ───────────────────────────────────────────────
        let metrics = MetricsLogger::new(cfg.metrics_dir.clone())?;

        // ── Step 5: Train (Layer 5) ───────────────────────────────────────────
        let outcome = run_training(cfg, data.labels.len(), data.train, data.val, &metrics)?;

        // ── Step 6: Save artifact ─────────────────────────────────────────────
        // Always the final epoch's weights; any previous file is replaced.
        let metadata = ModelMetadata::new(
            data.labels,
            outcome.config.clone(),
            cfg.clone(),
            outcome.final_metrics().cloned(),
        );
        ModelStore::new(&cfg.model_path).save(&outcome.model, &metadata)?;

        println!("Model saved to '{}'", cfg.model_path);
        println!("Metrics written to '{}'", metrics.csv_path().display());
        Ok(())
    }
}
