// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `live` and `classify`
// and all their configurable flags. Every default reproduces
// the fixed configuration, so running without flags trains on
// data/seasons for 10 epochs at 128×128 on top of the ImageNet
// trunk in weights/mobilenet_v2.pth, and watches camera 0.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{live_use_case::LiveConfig, train_use_case::TrainConfig};
use crate::data::augment::AugmentConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the season classifier on a folder of labelled images
    Train(TrainArgs),

    /// Classify the live camera feed
    Live(LiveArgs),

    /// Classify image files with a trained model
    Classify(ClassifyArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Root directory with one sub-folder of images per season
    #[arg(long, default_value = "data/seasons")]
    pub data_dir: String,

    /// Where the trained model is written (replaced if it exists)
    #[arg(long, default_value = "season_model.tar.gz")]
    pub model_path: String,

    /// Pretrained MobileNetV2 weights: torchvision .pth or Burn .mpk
    #[arg(long, default_value = "weights/mobilenet_v2.pth")]
    pub backbone_weights: String,

    /// Freeze an untrained MobileNetV2 instead of loading weights
    #[arg(long, conflicts_with = "backbone_weights")]
    pub random_backbone: bool,

    /// Directory for metrics.csv
    #[arg(long, default_value = "runs")]
    pub metrics_dir: String,

    /// Images are resized to this many pixels per side
    #[arg(long, default_value_t = 128)]
    pub image_size: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Number of full passes through the training images
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Fraction of each class held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub validation_split: f64,

    /// Width of the dense layer between pooling and output
    #[arg(long, default_value_t = 12)]
    pub hidden_units: usize,

    /// Seed for the per-epoch shuffle and the augmentation draws
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Train on the plain images (no rotation, shift or flip)
    #[arg(long)]
    pub no_augment: bool,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:         a.data_dir,
            model_path:       a.model_path,
            backbone_weights: a.backbone_weights,
            random_backbone:  a.random_backbone,
            metrics_dir:      a.metrics_dir,
            image_size:       a.image_size,
            batch_size:       a.batch_size,
            epochs:           a.epochs,
            lr:               a.lr,
            validation_split: a.validation_split,
            hidden_units:     a.hidden_units,
            seed:             a.seed,
            augment:          if a.no_augment { AugmentConfig::disabled() } else { AugmentConfig::default() },
        }
    }
}

/// All arguments for the `live` command
#[derive(Args, Debug)]
pub struct LiveArgs {
    /// Model written by `train`
    #[arg(long, default_value = "season_model.tar.gz")]
    pub model_path: PathBuf,

    /// OpenCV camera index
    #[arg(long, default_value_t = 0)]
    pub camera_index: i32,

    #[arg(long, default_value = "Season Detection")]
    pub window_title: String,
}

impl From<LiveArgs> for LiveConfig {
    fn from(a: LiveArgs) -> Self {
        LiveConfig {
            model_path:   a.model_path,
            camera_index: a.camera_index,
            window_title: a.window_title,
        }
    }
}

/// All arguments for the `classify` command
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Model written by `train`
    #[arg(long, default_value = "season_model.tar.gz")]
    pub model_path: PathBuf,

    /// One or more image files
    #[arg(required = true)]
    pub images: Vec<PathBuf>,
}
