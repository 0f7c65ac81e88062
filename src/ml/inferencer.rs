// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::{anyhow, Result};
use burn::prelude::*;
use image::RgbImage;
use std::path::Path;

use crate::data::preprocessor::{Preprocessor, CHANNELS};
use crate::domain::{labels::LabelSet, prediction::Prediction, traits::FrameClassifier};
use crate::infra::model_store::ModelStore;
use crate::ml::{model::SeasonClassifier, InferBackend};

pub struct Inferencer<B: Backend = InferBackend> {
    model:        SeasonClassifier<B>,
    labels:       LabelSet,
    preprocessor: Preprocessor,
    device:       B::Device,
}

impl Inferencer<InferBackend> {
    /// Load a trained artifact onto the default WGPU device
    pub fn from_artifact(path: &Path) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        Self::load(&ModelStore::new(path), device)
    }
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: SeasonClassifier<B>, labels: LabelSet, image_size: u32, device: B::Device) -> Self {
        Self { model, labels, preprocessor: Preprocessor::new(image_size), device }
    }

    pub fn load(store: &ModelStore, device: B::Device) -> Result<Self> {
        let (model, metadata) = store.load::<B>(&device)?;
        tracing::info!(
            "Model loaded from '{}' ({} classes: {})",
            store.path().display(),
            metadata.labels.len(),
            metadata.labels.names().join(", "),
        );
        Ok(Self::new(model, metadata.labels, metadata.model.image_size as u32, device))
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Resize, scale to [0, 1], run the model, pick the top class.
    pub fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        let size   = self.preprocessor.size() as usize;
        let pixels = self.preprocessor.prepare(image);

        let input = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([1, size, size, CHANNELS]);

        let probabilities: Vec<f32> = self
            .model
            .predict_proba(input)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read model output: {e:?}"))?;

        let prediction = Prediction::from_probabilities(probabilities, &self.labels)?;
        tracing::debug!("Predicted '{}' ({:.3})", prediction.label, prediction.confidence());
        Ok(prediction)
    }
}

impl<B: Backend> FrameClassifier for Inferencer<B> {
    fn classify(&self, frame: &RgbImage) -> Result<Prediction> {
        self.predict(frame)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::SeasonClassifierConfig;
    use burn::backend::NdArray;
    use image::Rgb;

    type TestBackend = NdArray<f32>;

    fn inferencer(image_size: usize) -> Inferencer<TestBackend> {
        let device = Default::default();
        let labels = LabelSet::from_folder_names(
            ["Invierno", "Otono", "Primavera", "Verano"].iter().map(|s| s.to_string()).collect(),
        )
        .unwrap();
        let model  = SeasonClassifierConfig::new(labels.len())
            .with_image_size(image_size)
            .init::<TestBackend>(&device);
        Inferencer::new(model, labels, image_size as u32, device)
    }

    #[test]
    fn test_black_frame_gives_valid_prediction() {
        let inf   = inferencer(128);
        let frame = RgbImage::new(128, 128);
        let p     = inf.predict(&frame).unwrap();
        assert!(p.index < 4);
        assert_eq!(p.probabilities.len(), 4);
        let total: f32 = p.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert_eq!(inf.labels().name(p.index), Some(p.label.as_str()));
    }

    #[test]
    fn test_any_frame_size_is_accepted() {
        let inf   = inferencer(32);
        let frame = RgbImage::from_pixel(640, 480, Rgb([90, 140, 60]));
        let p     = inf.classify(&frame).unwrap();
        assert!(p.index < 4);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let inf   = inferencer(32);
        let frame = RgbImage::from_fn(50, 40, |x, y| Rgb([x as u8 * 5, y as u8 * 6, 100]));
        let a = inf.predict(&frame).unwrap();
        let b = inf.predict(&frame).unwrap();
        assert_eq!(a.index, b.index);
        assert_eq!(a.probabilities, b.probabilities);
    }
}
