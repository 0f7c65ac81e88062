// ============================================================
// Layer 2 — ClassifyUseCase
// ============================================================
// Runs the live inference step on image files instead of camera
// frames: load → classify → report label and probabilities.
// Handy for checking a trained model without a webcam.

use anyhow::{ensure, Result};
use std::path::{Path, PathBuf};

use crate::data::loader::load_rgb;
use crate::domain::{prediction::Prediction, traits::FrameClassifier};

pub struct ClassifyUseCase<C: FrameClassifier> {
    classifier: C,
}

impl<C: FrameClassifier> ClassifyUseCase<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// Classify every image in order. Any unreadable file aborts the run.
    pub fn execute(&self, images: &[PathBuf]) -> Result<Vec<(PathBuf, Prediction)>> {
        ensure!(!images.is_empty(), "No images given");

        images
            .iter()
            .map(|path| Ok((path.clone(), self.classify_file(path)?)))
            .collect()
    }

    fn classify_file(&self, path: &Path) -> Result<Prediction> {
        let image      = load_rgb(path)?;
        let prediction = self.classifier.classify(&image)?;
        tracing::debug!("'{}' → {}", path.display(), prediction.label);
        Ok(prediction)
    }
}

/// "Verano (91.2%)  [Invierno 2.1% | Otono 3.3% | ...]"
pub fn format_prediction(prediction: &Prediction, labels: &[String]) -> String {
    let breakdown: Vec<String> = labels
        .iter()
        .zip(&prediction.probabilities)
        .map(|(name, p)| format!("{name} {:.1}%", p * 100.0))
        .collect();
    format!(
        "{} ({:.1}%)  [{}]",
        prediction.label,
        prediction.confidence() * 100.0,
        breakdown.join(" | ")
    )
}
