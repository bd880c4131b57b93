// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs every stored batch through a trained VAE and scores each
// image by its reconstruction error.
//
//   reconstructions  [N, C, H, W]   N = n_batches * batch_size
//   losses           [N]            mean squared error per image
//
// The forward pass samples z just as in training, so two runs on
// the same data give slightly different reconstructions.

use anyhow::{anyhow, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use indicatif::ProgressBar;

use crate::data::{batcher::LensBatcher, dataset::LensDataset};
use crate::ml::model::Vae;

pub struct Reconstruction {
    /// [n_samples, channels, height, width]
    pub shape:  [usize; 4],
    pub pixels: Vec<f32>,
    /// Per-image MSE, in flattened sample order
    pub losses: Vec<f32>,
}

pub struct Evaluator<B: Backend> {
    model:  Vae<B>,
    device: B::Device,
}

impl<B: Backend> Evaluator<B> {
    pub fn new(model: Vae<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    pub fn evaluate(&self, dataset: &LensDataset) -> Result<Reconstruction> {
        let array   = dataset.array();
        let batcher = LensBatcher::<B>::new(self.device.clone());
        let mut pixels = Vec::with_capacity(array.as_slice().len());

        let progress = ProgressBar::new(dataset.n_batches() as u64);
        for items in dataset.batches() {
            let batch  = batcher.batch(items);
            let output = self.model.forward(batch.images);
            let values = output
                .reconstruction
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow!("Cannot read reconstruction back from device: {e:?}"))?;
            pixels.extend(values);
            progress.inc(1);
        }
        progress.finish_and_clear();

        let losses = per_sample_mse(array.as_slice(), &pixels, array.sample_len());
        tracing::info!("Reconstructed {} images", losses.len());

        Ok(Reconstruction { shape: array.flattened_shape(), pixels, losses })
    }
}

/// Mean squared error of each `sample_len`-sized chunk.
pub fn per_sample_mse(inputs: &[f32], reconstructions: &[f32], sample_len: usize) -> Vec<f32> {
    if sample_len == 0 {
        return Vec::new();
    }
    inputs
        .chunks_exact(sample_len)
        .zip(reconstructions.chunks_exact(sample_len))
        .map(|(x, y)| {
            let sum: f64 = x
                .iter()
                .zip(y)
                .map(|(a, b)| {
                    let d = (*a - *b) as f64;
                    d * d
                })
                .sum();
            (sum / sample_len as f64) as f32
        })
        .collect()
}
