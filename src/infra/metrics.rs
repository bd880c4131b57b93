// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records the loss curve to a CSV file after each epoch.
//
// Output file: <checkpoint_dir>/metrics.csv
//
//   epoch,train_loss,learning_rate
//   1,0.042113,0.000081
//   2,0.031874,0.000357
//   ...
//
// The file is appended to across runs, so a `--pretrain-mode
// continue` session extends the previous curve.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const HEADER: &str = "epoch,train_loss,learning_rate";

/// One row of metrics for a single training epoch
#[derive(Debug, Clone)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Sum of (batch loss × batch size) over the epoch, divided by the
    /// number of batches
    pub train_loss: f64,

    /// Learning rate applied on the epoch's final step
    pub learning_rate: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, learning_rate: f64) -> Self {
        Self { epoch, train_loss, learning_rate }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{:.6},{:.6e}", m.epoch, m.train_loss, m.learning_rate)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.6}, lr={:.3e}",
            m.epoch, m.train_loss, m.learning_rate,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
