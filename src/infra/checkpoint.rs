// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores VAE weights using Burn's CompactRecorder.
//
// What lives in the checkpoint directory:
//   VAE.mpk.gz        ← model weights, overwritten after every epoch
//                       (also where downloaded pretrained weights land)
//   vae_config.json   ← architecture needed to rebuild the model
//                       before its weights can be loaded
//   metrics.csv       ← written by MetricsLogger, not by this module
//
// Burn's CompactRecorder:
//   - Serialises parameters to MessagePack, half precision
//   - Compresses with gzip
//   - Appends the .mpk.gz extension itself
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Context, Result};
use std::{fs, io::Read, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::ml::model::{Vae, VaeConfig};

/// File stem of the weights record; the recorder adds ".mpk.gz".
pub const WEIGHTS_STEM: &str = "VAE";
pub const WEIGHTS_FILE: &str = "VAE.mpk.gz";
pub const CONFIG_FILE:  &str = "vae_config.json";

/// Every CompactRecorder file starts with the gzip magic.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager for `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the weights record on disk.
    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(WEIGHTS_FILE)
    }

    pub fn has_weights(&self) -> bool {
        self.weights_path().exists()
    }

    pub fn has_config(&self) -> bool {
        self.dir.join(CONFIG_FILE).exists()
    }

    /// Write the model's current weights, replacing the previous record.
    pub fn save_model<B: Backend>(&self, model: &Vae<B>) -> Result<()> {
        let path = self.dir.join(WEIGHTS_STEM);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved weights to '{}'", self.weights_path().display());
        Ok(())
    }

    /// Load the stored weights into `model`.
    ///
    /// `model` must have been built from the matching VaeConfig.
    pub fn load_model<B: Backend>(&self, model: Vae<B>, device: &B::Device) -> Result<Vae<B>> {
        let path = self.dir.join(WEIGHTS_STEM);

        let record = CompactRecorder::new()
            .load(path, device)
            .with_context(|| {
                format!(
                    "Cannot load weights '{}'. Run 'train' first, or check the record matches vae_config.json.",
                    self.weights_path().display()
                )
            })?;

        tracing::info!("Loaded weights from '{}'", self.weights_path().display());
        Ok(model.load_record(record))
    }

    /// Make sure the weights file is a gzip-compressed Burn record.
    ///
    /// Anything else (a PyTorch pickle, an HTML error page) is deleted,
    /// so the next transfer run downloads it again instead of skipping.
    pub fn check_weights_format(&self) -> Result<()> {
        let path = self.weights_path();
        let mut file = fs::File::open(&path)
            .with_context(|| format!("Cannot read weights '{}'", path.display()))?;
        let mut head = [0u8; 2];
        let is_gzip = file.read_exact(&mut head).is_ok() && head == GZIP_MAGIC;
        drop(file);

        if !is_gzip {
            fs::remove_file(&path)
                .with_context(|| format!("Cannot remove '{}'", path.display()))?;
            bail!(
                "'{}' is not a Burn CompactRecorder record (expected gzip data, found bytes {:02x?}) \
                 and was removed. Pretrained weights must be published in Burn's .mpk.gz format; \
                 PyTorch .pth files cannot be loaded.",
                path.display(), head
            );
        }
        Ok(())
    }

    pub fn save_config(&self, cfg: &VaeConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<VaeConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read model config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Corrupt model config in '{}'", path.display()))
    }
}
