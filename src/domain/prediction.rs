// ============================================================
// Layer 3 — Prediction Domain Type
// ============================================================
// The result of classifying one frame: the full probability
// vector plus the arg-max class and its display label.

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

use crate::domain::labels::LabelSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Arg-max index into the label set
    pub index: usize,

    /// Class name for `index`
    pub label: String,

    /// One probability per class, in label-set order
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Pick the most probable class.
    /// Ties resolve to the lowest index, like numpy's argmax.
    pub fn from_probabilities(probabilities: Vec<f32>, labels: &LabelSet) -> Result<Self> {
        ensure!(
            probabilities.len() == labels.len(),
            "Model produced {} probabilities but the label set has {} classes",
            probabilities.len(),
            labels.len()
        );

        let mut best: Option<(usize, f32)> = None;
        for (i, &p) in probabilities.iter().enumerate() {
            if p.is_nan() {
                bail!("Model produced a NaN probability for class {}", i);
            }
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((i, p)),
            }
        }

        let Some((index, _)) = best else {
            bail!("Cannot pick a class from an empty probability vector");
        };

        let label = labels
            .name(index)
            .map(str::to_string)
            .unwrap_or_default();

        Ok(Self { index, label, probabilities })
    }

    /// Probability of the predicted class
    pub fn confidence(&self) -> f32 {
        self.probabilities.get(self.index).copied().unwrap_or(0.0)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSet {
        LabelSet::from_folder_names(vec![
            "Invierno".into(), "Otono".into(), "Primavera".into(), "Verano".into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_picks_argmax() {
        let p = Prediction::from_probabilities(vec![0.1, 0.2, 0.6, 0.1], &labels()).unwrap();
        assert_eq!(p.index, 2);
        assert_eq!(p.label, "Primavera");
        assert!((p.confidence() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_tie_picks_first() {
        let p = Prediction::from_probabilities(vec![0.25; 4], &labels()).unwrap();
        assert_eq!(p.index, 0);
        assert_eq!(p.label, "Invierno");
    }

    #[test]
    fn test_length_mismatch_is_error() {
        assert!(Prediction::from_probabilities(vec![0.5, 0.5], &labels()).is_err());
    }

    #[test]
    fn test_nan_is_error() {
        let probs = vec![0.1, f32::NAN, 0.4, 0.5];
        assert!(Prediction::from_probabilities(probs, &labels()).is_err());
    }
}
