// ============================================================
// Layer 2 — Pretrained Model Restore
// ============================================================
// Shared by train and evaluate:
//
//   transfer → fetch the published weights into the checkpoint
//              directory, record their architecture, then load
//   continue → load whatever the checkpoint directory holds
//
// Either way the restored architecture must accept the data's
// channel count and image size.

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::domain::{
    lens_array::LensArray,
    options::{PretrainMode, PretrainedModel},
    traits::WeightsFetcher,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{Vae, VaeConfig};

/// Architecture the published pretrained models were trained with.
pub fn published_config(channels: usize, height: usize, width: usize) -> VaeConfig {
    VaeConfig::new(channels, height, width)
}

pub fn restore_model<B: Backend>(
    mode:    PretrainMode,
    choice:  PretrainedModel,
    refresh: bool,
    ckpt:    &CheckpointManager,
    fetcher: &dyn WeightsFetcher,
    data:    &LensArray,
    device:  &B::Device,
) -> Result<(Vae<B>, VaeConfig)> {
    match mode {
        PretrainMode::Transfer => {
            tracing::info!("Fetching pretrained model {} weights", choice);
            let had_weights = ckpt.has_weights();
            fetcher
                .fetch(choice, &ckpt.weights_path())
                .with_context(|| format!("Cannot obtain pretrained model {choice}"))?;
            ckpt.check_weights_format()?;

            // freshly fetched weights always come with the published architecture
            if refresh || !had_weights || !ckpt.has_config() {
                ckpt.save_config(&published_config(data.channels(), data.height(), data.width()))?;
            }
        }
        PretrainMode::Continue => {
            tracing::info!("Importing pretrained weights from '{}'", ckpt.dir().display());
        }
    }

    let cfg = ckpt.load_config()?;
    cfg.check_input(data.channels(), data.height(), data.width())?;
    let model = ckpt.load_model(cfg.init::<B>(device)?, device)?;
    Ok((model, cfg))
}
