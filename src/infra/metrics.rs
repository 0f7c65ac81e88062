// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: average cross-entropy loss on the training stream
//   - train_acc:  fraction of training images classified correctly
//   - val_loss:   average cross-entropy loss on the validation stream
//   - val_acc:    fraction of validation images classified correctly
//
// Validation columns are left empty when the validation split
// is 0 and there is nothing to evaluate.
//
// Output file: runs/metrics.csv (appended across runs)
//
// Example CSV output:
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,1.284500,0.412000,1.102300,0.525000
//   2,0.953100,0.618000,0.874300,0.662500
//   ...
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

const CSV_HEADER: &str = "epoch,train_loss,train_acc,val_loss,val_acc";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all training batches.
    /// A random head over N classes starts near ln(N).
    pub train_loss: f64,

    /// Range: [0.0, 1.0]
    pub train_acc: f64,

    /// None when there is no validation data
    pub val_loss: Option<f64>,

    pub val_acc: Option<f64>,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        train_acc:  f64,
        val_loss:   Option<f64>,
        val_acc:    Option<f64>,
    ) -> Self {
        Self { epoch, train_loss, train_acc, val_loss, val_acc }
    }

    /// One-line human readable form used for the per-epoch console line
    pub fn summary(&self) -> String {
        let mut line = format!(
            "train_loss={:.4} | train_acc={:.1}%",
            self.train_loss,
            self.train_acc * 100.0,
        );
        if let (Some(loss), Some(acc)) = (self.val_loss, self.val_acc) {
            line.push_str(&format!(" | val_loss={:.4} | val_acc={:.1}%", loss, acc * 100.0));
        }
        line
    }

    fn csv_row(&self) -> String {
        let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
        format!(
            "{},{:.6},{:.6},{},{}",
            self.epoch,
            self.train_loss,
            self.train_acc,
            opt(self.val_loss),
            opt(self.val_acc),
        )
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet,
    /// so repeated runs append to one log.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", m.csv_row())?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:?}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_header_written_once_and_rows_appended() {
        let dir  = tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();

        let logger = MetricsLogger::new(path.clone()).unwrap();
        logger.log(&EpochMetrics::new(1, 1.2, 0.4, Some(1.1), Some(0.5))).unwrap();

        // second run appends to the same file
        let logger = MetricsLogger::new(path).unwrap();
        logger.log(&EpochMetrics::new(1, 0.9, 0.6, None, None)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1,1.200000,0.400000,1.100000,0.500000");
        assert_eq!(lines[2], "1,0.900000,0.600000,,");
    }

    #[test]
    fn test_summary_omits_missing_validation() {
        let m = EpochMetrics::new(3, 0.5, 0.75, None, None);
        assert_eq!(m.summary(), "train_loss=0.5000 | train_acc=75.0%");

        let m = EpochMetrics::new(3, 0.5, 0.75, Some(0.25), Some(0.9));
        assert!(m.summary().ends_with("val_loss=0.2500 | val_acc=90.0%"));
    }
}
