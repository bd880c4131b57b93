// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Orchestrates an evaluation run:
//
//   Step 1: Load the batched .npy array       (Layer 4 - data)
//   Step 2: Restore the VAE                    (Layer 5 / 6)
//   Step 3: Reconstruct every image            (Layer 5 - ml)
//   Step 4: Write reconstructions and losses   (Layer 4 - npy)
//
// Outputs in out_path:
//   Recon_samples.npy  [n_samples, channels, height, width]
//   Recon_losses.npy   [n_samples]

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::pretrain::restore_model;
use crate::data::{dataset::LensDataset, loader::NpyLoader, npy::write_npy};
use crate::domain::{
    lens_array::LensArray,
    options::{BackendKind, PretrainMode, PretrainedModel},
    traits::{ImageSource, WeightsFetcher},
};
use crate::infra::{checkpoint::CheckpointManager, downloader::DriveDownloader};
use crate::ml::{
    backend::{cpu_device, gpu_device, CpuBackend, GpuBackend},
    evaluator::Evaluator,
};

pub const RECON_FILE:  &str = "Recon_samples.npy";
pub const LOSSES_FILE: &str = "Recon_losses.npy";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateConfig {
    pub data_path:       String,
    pub checkpoint_path: String,
    /// Directory that receives the reconstructions
    pub out_path:        String,
    pub pretrain_mode:   PretrainMode,
    pub pretrain_model:  PretrainedModel,
    pub backend:         BackendKind,
    pub refresh_weights: bool,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            data_path:       "./Data/no_sub_test.npy".to_string(),
            checkpoint_path: "./Weights".to_string(),
            out_path:        "./Results".to_string(),
            pretrain_mode:   PretrainMode::Transfer,
            pretrain_model:  PretrainedModel::A,
            backend:         BackendKind::Wgpu,
            refresh_weights: false,
        }
    }
}

/// What an evaluation produced.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Per-image reconstruction MSE, flattened sample order
    pub losses:       Vec<f32>,
    pub samples_path: PathBuf,
    pub losses_path:  PathBuf,
}

impl EvaluationReport {
    pub fn mean_loss(&self) -> f32 {
        if self.losses.is_empty() {
            return 0.0;
        }
        self.losses.iter().sum::<f32>() / self.losses.len() as f32
    }

    /// 0.0 when nothing was evaluated, like `mean_loss`.
    pub fn min_loss(&self) -> f32 {
        self.losses.iter().copied().reduce(f32::min).unwrap_or(0.0)
    }

    pub fn max_loss(&self) -> f32 {
        self.losses.iter().copied().reduce(f32::max).unwrap_or(0.0)
    }
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        let source  = NpyLoader::new(&self.config.data_path);
        let fetcher = DriveDownloader::new(self.config.refresh_weights)?;
        self.execute_with(&source, &fetcher)
    }

    pub fn execute_with(
        &self,
        source:  &dyn ImageSource,
        fetcher: &dyn WeightsFetcher,
    ) -> Result<EvaluationReport> {
        let data = source.load()?;
        match self.config.backend {
            BackendKind::Wgpu    => self.evaluate_on::<GpuBackend>(data, fetcher, gpu_device()),
            BackendKind::NdArray => self.evaluate_on::<CpuBackend>(data, fetcher, cpu_device()),
        }
    }

    fn evaluate_on<B: Backend>(
        &self,
        data:    LensArray,
        fetcher: &dyn WeightsFetcher,
        device:  B::Device,
    ) -> Result<EvaluationReport> {
        let cfg  = &self.config;
        let ckpt = CheckpointManager::new(&cfg.checkpoint_path)?;
        let (model, _) = restore_model::<B>(
            cfg.pretrain_mode, cfg.pretrain_model, cfg.refresh_weights,
            &ckpt, fetcher, &data, &device,
        )?;

        let recon = Evaluator::new(model, device).evaluate(&LensDataset::new(data))?;

        let out_dir = PathBuf::from(&cfg.out_path);
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Cannot create output directory '{}'", out_dir.display()))?;

        let samples_path = out_dir.join(RECON_FILE);
        write_npy(&samples_path, &recon.shape, &recon.pixels)?;
        let losses_path = out_dir.join(LOSSES_FILE);
        write_npy(&losses_path, &[recon.losses.len()], &recon.losses)?;
        tracing::info!("Saved reconstructions to '{}'", samples_path.display());

        Ok(EvaluationReport { losses: recon.losses, samples_path, losses_path })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::data::npy::read_npy;

    struct FixedArray(LensArray);

    impl ImageSource for FixedArray {
        fn load(&self) -> Result<LensArray> {
            Ok(self.0.clone())
        }
    }

    struct NoNetwork;

    impl WeightsFetcher for NoNetwork {
        fn fetch(&self, model: PretrainedModel, _dest: &Path) -> Result<()> {
            anyhow::bail!("unexpected download of model {model}")
        }
    }

    fn lens_data(n_batches: usize) -> LensArray {
        let n = n_batches * 2 * 71 * 71;
        LensArray::new([n_batches, 2, 1, 71, 71], (0..n).map(|i| (i % 3) as f32 / 3.0).collect())
            .unwrap()
    }

    #[test]
    fn test_evaluates_trained_checkpoint() {
        let weights = tempfile::tempdir().unwrap();
        let results = tempfile::tempdir().unwrap();

        let train = TrainConfig {
            epochs:          1,
            checkpoint_path: weights.path().display().to_string(),
            pretrain:        false,
            backend:         BackendKind::NdArray,
            hidden_dim:      4,
            latent_dim:      2,
            ..TrainConfig::default()
        };
        TrainUseCase::new(train)
            .execute_with(&FixedArray(lens_data(2)), &NoNetwork)
            .unwrap();

        let eval = EvaluateConfig {
            checkpoint_path: weights.path().display().to_string(),
            out_path:        results.path().join("out").display().to_string(),
            pretrain_mode:   PretrainMode::Continue,
            backend:         BackendKind::NdArray,
            ..EvaluateConfig::default()
        };
        let report = EvaluateUseCase::new(eval)
            .execute_with(&FixedArray(lens_data(3)), &NoNetwork)
            .unwrap();

        assert_eq!(report.losses.len(), 6);
        assert!(report.min_loss() <= report.mean_loss());
        assert!(report.mean_loss() <= report.max_loss());

        let samples = read_npy(&report.samples_path).unwrap();
        assert_eq!(samples.shape, vec![6, 1, 71, 71]);
        let losses = read_npy(&report.losses_path).unwrap();
        assert_eq!(losses.data, report.losses);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let weights = tempfile::tempdir().unwrap();
        let eval = EvaluateConfig {
            checkpoint_path: weights.path().display().to_string(),
            pretrain_mode:   PretrainMode::Continue,
            backend:         BackendKind::NdArray,
            ..EvaluateConfig::default()
        };
        assert!(EvaluateUseCase::new(eval)
            .execute_with(&FixedArray(lens_data(1)), &NoNetwork)
            .is_err());
    }

    #[test]
    fn test_empty_report_stats_are_zero() {
        let report = EvaluationReport {
            losses:       Vec::new(),
            samples_path: PathBuf::new(),
            losses_path:  PathBuf::new(),
        };
        assert_eq!(report.mean_loss(), 0.0);
        assert_eq!(report.min_loss(), 0.0);
        assert_eq!(report.max_loss(), 0.0);
    }

    #[test]
    fn test_report_stats() {
        let report = EvaluationReport {
            losses:       vec![0.3, 0.1, 0.2],
            samples_path: PathBuf::new(),
            losses_path:  PathBuf::new(),
        };
        assert_eq!(report.min_loss(), 0.1);
        assert_eq!(report.max_loss(), 0.3);
    }
}
