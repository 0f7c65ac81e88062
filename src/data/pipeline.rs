// ============================================================
// Layer 4 — Data Pipeline Assembly
// ============================================================
// Runs the data steps in order and hands back two datasets:
//
//   scan folder → decode + resize → stratified split
//       ├── train: SeasonDataset with augmentation
//       └── val:   SeasonDataset without augmentation
//
// The datasets are turned into Burn DataLoaders by the trainer;
// each call to loader.iter() is one full pass (one epoch), so
// both streams repeat for as many epochs as requested.

use anyhow::{ensure, Result};
use std::path::PathBuf;

use crate::data::{
    augment::{AugmentConfig, Augmenter},
    dataset::SeasonDataset,
    loader::ImageFolderLoader,
    preprocessor::Preprocessor,
    splitter::split_by_class,
};
use crate::domain::labels::LabelSet;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir:            PathBuf,
    pub image_size:          u32,
    pub validation_fraction: f64,
    pub augment:             AugmentConfig,
    /// Seeds the augmentation draws
    pub seed:                u64,
}

pub struct PreparedData {
    pub labels: LabelSet,
    pub train:  SeasonDataset,
    pub val:    SeasonDataset,
}

pub fn prepare(cfg: &PipelineConfig) -> Result<PreparedData> {
    ensure!(
        (0.0..1.0).contains(&cfg.validation_fraction),
        "validation split must be in [0, 1) (got {})",
        cfg.validation_fraction
    );
    ensure!(cfg.image_size > 0, "image size must be positive");

    let preprocessor = Preprocessor::new(cfg.image_size);
    let augmenter    = Augmenter::new(cfg.augment.clone())?;

    let loader = ImageFolderLoader::new(&cfg.data_dir);
    let index  = loader.scan()?;
    for (name, count) in index.labels.names().iter().zip(index.class_counts()) {
        tracing::info!("  class '{}': {} images", name, count);
    }
    let images = loader.load(&index, &preprocessor)?;
    tracing::info!("Decoded {} images at {}x{}", images.len(), cfg.image_size, cfg.image_size);

    let (train, val) = split_by_class(images, cfg.validation_fraction);
    tracing::info!("Split: {} train, {} validation", train.len(), val.len());
    ensure!(!train.is_empty(), "No images left for training after the validation split");

    Ok(PreparedData {
        labels: index.labels,
        train:  SeasonDataset::augmented(train, preprocessor, augmenter, cfg.seed),
        val:    SeasonDataset::plain(val, preprocessor),
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        batcher::ImageBatcher,
        loader::tests::write_class,
    };
    use burn::{
        backend::NdArray,
        data::{dataloader::DataLoaderBuilder, dataset::Dataset},
        prelude::*,
    };
    use tempfile::tempdir;

    type TestBackend = NdArray<f32>;

    fn config(root: PathBuf, image_size: u32) -> PipelineConfig {
        PipelineConfig {
            data_dir:            root,
            image_size,
            validation_fraction: 0.2,
            augment:             AugmentConfig::default(),
            seed:                42,
        }
    }

    #[test]
    fn test_split_sizes_per_class() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "Invierno", 10, 10);
        write_class(dir.path(), "Verano",    5, 200);

        let data = prepare(&config(dir.path().to_path_buf(), 16)).unwrap();
        assert_eq!(data.labels.len(), 2);
        // floor(10*0.2) + floor(5*0.2) = 2 + 1
        assert_eq!(data.val.len(), 3);
        assert_eq!(data.train.len(), 12);
    }

    #[test]
    fn test_batches_have_valid_labels_shapes_and_range() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "Invierno",  12, 10);
        write_class(dir.path(), "Otono",     9,  80);
        write_class(dir.path(), "Primavera", 14, 140);
        write_class(dir.path(), "Verano",    11, 220);

        let data        = prepare(&config(dir.path().to_path_buf(), 128)).unwrap();
        let num_classes = data.labels.len() as i64;
        let device      = <TestBackend as Backend>::Device::default();

        for dataset in [data.train, data.val] {
            let expected = dataset.len();
            let loader = DataLoaderBuilder::new(ImageBatcher::<TestBackend>::new(device.clone(), 128))
                .batch_size(32)
                .shuffle(42)
                .num_workers(1)
                .build(dataset);

            let mut seen = 0;
            for batch in loader.iter() {
                let [n, h, w, c] = batch.images.dims();
                assert!(n <= 32 && n > 0);
                assert_eq!((h, w, c), (128, 128, 3));

                let min: f32 = batch.images.clone().min().into_scalar().elem();
                let max: f32 = batch.images.max().into_scalar().elem();
                assert!(min >= 0.0 && max <= 1.0);

                let labels: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
                assert_eq!(labels.len(), n);
                assert!(labels.iter().all(|&l| l >= 0 && l < num_classes));
                seen += n;
            }
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn test_bad_validation_split_is_rejected() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "a", 3, 0);
        let mut cfg = config(dir.path().to_path_buf(), 16);
        cfg.validation_fraction = 1.0;
        assert!(prepare(&cfg).is_err());
    }
}
