// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from a folder of photos all the
// way to device-ready tensor batches.
//
// The pipeline flows in this order:
//
//   class folders on disk
//       │
//       ▼
//   ImageFolderLoader → scans classes, decodes + resizes images
//       │
//       ▼
//   split_by_class    → stratified train / validation split
//       │
//       ▼
//   SeasonDataset     → implements Burn's Dataset trait
//       │                (training copy augments on every get)
//       ▼
//   ImageBatcher      → stacks samples into NHWC tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Preprocessor is shared with the inference path so that camera
// frames are resized and scaled exactly like training images.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Scans class folders and decodes images
pub mod loader;

/// Resize + [0, 1] scaling shared by training and inference
pub mod preprocessor;

/// Random rotation / shift / flip for training images
pub mod augment;

/// Implements Burn's Dataset trait for labelled images
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Stratified train/validation split
pub mod splitter;

/// Runs the steps above in order
pub mod pipeline;
