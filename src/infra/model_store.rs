// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores the trained classifier as ONE file.
//
// Artifact layout (a gzip-compressed tar archive):
//
//   season_model.tar.gz
//     ├── metadata.json   ← label order, model config, training
//     │                     config, last-epoch metrics
//     └── model.bin       ← all weights (trunk + head), f32
//
// Why keep the metadata next to the weights?
//   The weights alone do not say which output index means which
//   season, nor the input size the model was trained at. With
//   both in one archive, inference rebuilds the exact model and
//   maps indices to names without guessing.
//
// Weights are serialised with Burn's BinBytesRecorder at full
// precision. Saving writes to a sibling temp file and renames it
// over the target, so an interrupted save never leaves a
// half-written artifact and a new run always replaces the old one.
//
// Reference: Burn Book §5 (Records)

use anyhow::{anyhow, bail, Context, Result};
use burn::{
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};
use tar::{Archive, Builder, Header};

use crate::application::train_use_case::TrainConfig;
use crate::domain::labels::LabelSet;
use crate::infra::metrics::EpochMetrics;
use crate::ml::model::{SeasonClassifier, SeasonClassifierConfig};

const METADATA_ENTRY: &str = "metadata.json";
const WEIGHTS_ENTRY:  &str = "model.bin";

/// Bumped whenever the archive layout changes
pub const FORMAT_VERSION: u32 = 1;

// ─── Metadata ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub format_version: u32,

    /// Output index i ↔ labels.name(i)
    pub labels: LabelSet,

    /// Everything needed to rebuild the network before loading weights
    pub model: SeasonClassifierConfig,

    /// Hyper-parameters of the run that produced the weights
    pub training: TrainConfig,

    /// RFC 3339 timestamp
    pub trained_at: String,

    /// Metrics of the last epoch, if any epoch ran
    pub final_metrics: Option<EpochMetrics>,
}

impl ModelMetadata {
    pub fn new(
        labels:        LabelSet,
        model:         SeasonClassifierConfig,
        training:      TrainConfig,
        final_metrics: Option<EpochMetrics>,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            labels,
            model,
            training,
            trained_at: chrono::Local::now().to_rfc3339(),
            final_metrics,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            bail!(
                "Unsupported model format version {} (expected {})",
                self.format_version,
                FORMAT_VERSION
            );
        }
        if self.labels.is_empty() {
            bail!("Model metadata has no class labels");
        }
        if self.labels.len() != self.model.num_classes {
            bail!(
                "Model metadata lists {} labels but the network has {} outputs",
                self.labels.len(),
                self.model.num_classes
            );
        }
        Ok(())
    }
}

// ─── Store ────────────────────────────────────────────────────────────────────
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write weights + metadata, replacing any existing artifact.
    pub fn save<B: Backend>(&self, model: &SeasonClassifier<B>, metadata: &ModelMetadata) -> Result<()> {
        let weights = BinBytesRecorder::<FullPrecisionSettings>::default()
            .record(model.clone().into_record(), ())
            .map_err(|e| anyhow!("Cannot serialise model weights: {e:?}"))?;
        let json = serde_json::to_string_pretty(metadata)
            .context("Cannot serialise model metadata")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }

        let tmp_path = self.tmp_path();
        write_archive(&tmp_path, json.as_bytes(), &weights)
            .with_context(|| format!("Cannot write model to '{}'", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Cannot move model into place at '{}'", self.path.display()))?;

        tracing::info!(
            "Saved model to '{}' ({:.1} MB of weights)",
            self.path.display(),
            weights.len() as f64 / 1_048_576.0
        );
        Ok(())
    }

    /// Rebuild the network from the metadata and load its weights.
    pub fn load<B: Backend>(&self, device: &B::Device) -> Result<(SeasonClassifier<B>, ModelMetadata)> {
        let (metadata, weights) = self.read_entries()?;

        let record = BinBytesRecorder::<FullPrecisionSettings>::default()
            .load(weights, device)
            .map_err(|e| anyhow!("Cannot load weights from '{}': {e:?}", self.path.display()))?;

        let model = metadata.model.init::<B>(device).load_record(record);
        Ok((model, metadata))
    }

    fn read_entries(&self) -> Result<(ModelMetadata, Vec<u8>)> {
        let file = File::open(&self.path).with_context(|| {
            format!(
                "Cannot open model '{}'. Have you run 'train' first?",
                self.path.display()
            )
        })?;
        let mut archive = Archive::new(GzDecoder::new(file));

        let mut metadata = None;
        let mut weights  = None;

        let entries = archive
            .entries()
            .with_context(|| format!("'{}' is not a model archive", self.path.display()))?;
        for entry in entries {
            let mut entry = entry?;
            let name = entry.path()?.to_string_lossy().to_string();
            match name.as_str() {
                METADATA_ENTRY => {
                    let mut json = String::new();
                    entry.read_to_string(&mut json)?;
                    let parsed: ModelMetadata = serde_json::from_str(&json)
                        .with_context(|| format!("Invalid {METADATA_ENTRY} in '{}'", self.path.display()))?;
                    metadata = Some(parsed);
                }
                WEIGHTS_ENTRY => {
                    let mut buffer = Vec::new();
                    entry.read_to_end(&mut buffer)?;
                    weights = Some(buffer);
                }
                _ => {}
            }
        }

        match (metadata, weights) {
            (Some(metadata), Some(weights)) => {
                metadata.validate()?;
                Ok((metadata, weights))
            }
            (None, _) => bail!("{METADATA_ENTRY} not found in '{}'", self.path.display()),
            (_, None) => bail!("{WEIGHTS_ENTRY} not found in '{}'", self.path.display()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_archive(path: &Path, metadata: &[u8], weights: &[u8]) -> Result<()> {
    let file    = File::create(path)?;
    let mut tar = Builder::new(GzEncoder::new(file, Compression::default()));

    for (name, bytes) in [(METADATA_ENTRY, metadata), (WEIGHTS_ENTRY, weights)] {
        let mut header = Header::new_gnu();
        header.set_path(name)?;
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append(&header, bytes)
            .with_context(|| format!("Failed to add {name} to archive"))?;
    }

    tar.into_inner()?.finish()?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use tempfile::tempdir;

    type TestBackend = NdArray<f32>;

    fn run(epochs: usize) -> TrainConfig {
        TrainConfig { epochs, ..TrainConfig::default() }
    }

    fn labels() -> LabelSet {
        LabelSet::new(vec!["Invierno".into(), "Otono".into(), "Primavera".into(), "Verano".into()]).unwrap()
    }

    #[test]
    fn test_save_then_load_gives_identical_predictions() {
        let dir    = tempdir().unwrap();
        let store  = ModelStore::new(dir.path().join("nested").join("season_model.tar.gz"));
        let device = Default::default();

        let cfg   = SeasonClassifierConfig::new(4).with_image_size(32);
        let model = cfg.init::<TestBackend>(&device);
        let meta  = ModelMetadata::new(labels(), cfg, run(3), Some(EpochMetrics::new(3, 0.4, 0.8, None, None)));
        store.save(&model, &meta).unwrap();

        let (loaded, loaded_meta) = store.load::<TestBackend>(&device).unwrap();
        assert_eq!(loaded_meta.labels, labels());
        assert_eq!(loaded_meta.model.image_size, 32);
        assert_eq!(loaded_meta.training.epochs, 3);

        let input = Tensor::<TestBackend, 4>::random(
            [2, 32, 32, 3],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let before: Vec<f32> = model.predict_proba(input.clone()).into_data().convert::<f32>().to_vec().unwrap();
        let after:  Vec<f32> = loaded.predict_proba(input).into_data().convert::<f32>().to_vec().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_save_overwrites_previous_artifact() {
        let dir    = tempdir().unwrap();
        let store  = ModelStore::new(dir.path().join("m.tar.gz"));
        let device = Default::default();

        let cfg = SeasonClassifierConfig::new(4).with_image_size(32);
        store.save(&cfg.init::<TestBackend>(&device), &ModelMetadata::new(labels(), cfg.clone(), run(1), None)).unwrap();
        store.save(&cfg.init::<TestBackend>(&device), &ModelMetadata::new(labels(), cfg, run(7), None)).unwrap();

        assert_eq!(store.load::<TestBackend>(&device).unwrap().1.training.epochs, 7);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_label_count_mismatch_is_rejected() {
        let dir    = tempdir().unwrap();
        let store  = ModelStore::new(dir.path().join("m.tar.gz"));
        let device = Default::default();

        let cfg = SeasonClassifierConfig::new(3).with_image_size(32);
        store.save(&cfg.init::<TestBackend>(&device), &ModelMetadata::new(labels(), cfg, run(1), None)).unwrap();
        assert!(store.load::<TestBackend>(&device).is_err());
    }

    #[test]
    fn test_missing_file_has_helpful_error() {
        let store  = ModelStore::new("does/not/exist.tar.gz");
        let device = Default::default();
        let err    = store.load::<TestBackend>(&device).unwrap_err();
        assert!(err.to_string().contains("train"));
    }
}
