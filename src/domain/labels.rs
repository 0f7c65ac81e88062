// ============================================================
// Layer 3 — LabelSet Domain Type
// ============================================================
// The ordered list of class names the classifier predicts.
//
// The order is the label → index mapping: index 0 is the first
// class folder in alphabetical order, index 1 the second, etc.
// For the seasons dataset this is:
//
//   0 → Invierno
//   1 → Otono
//   2 → Primavera
//   3 → Verano
//
// The LabelSet is written into the model artifact at training
// time and read back at inference time, so the display label
// for an output index always matches the folder it was trained on.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Ordered class names. Index in the Vec = model output index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Build a LabelSet from class names in output-index order.
    /// Rejects an empty list and duplicate names.
    pub fn new(names: Vec<String>) -> Result<Self> {
        ensure!(!names.is_empty(), "A label set needs at least one class");

        for (i, name) in names.iter().enumerate() {
            ensure!(
                !names[..i].contains(name),
                "Duplicate class name '{}' in label set",
                name
            );
        }

        Ok(Self { names })
    }

    /// Build a LabelSet from folder names, sorting them alphabetically
    /// first. This is how the data pipeline derives the vocabulary.
    pub fn from_folder_names(mut names: Vec<String>) -> Result<Self> {
        names.sort();
        Self::new(names)
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Class name for a model output index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
