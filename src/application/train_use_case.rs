// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run:
//
//   Step 1: Load the batched .npy array      (Layer 4 - data)
//   Step 2: Build or restore the VAE          (Layer 5 / 6)
//   Step 3: Save the architecture             (Layer 6 - infra)
//   Step 4: Run the training loop             (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::application::pretrain::restore_model;
use crate::data::{dataset::LensDataset, loader::NpyLoader};
use crate::domain::{
    lens_array::LensArray,
    options::{BackendKind, OptimizerKind, PretrainMode, PretrainedModel},
    traits::{ImageSource, WeightsFetcher},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    downloader::DriveDownloader,
    metrics::MetricsLogger,
};
use crate::ml::{
    backend::{cpu_device, gpu_device, CpuTrainBackend, GpuTrainBackend},
    model::VaeConfig,
    trainer::{run_training, TrainSettings},
};

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// .npy of shape [n_batches, batch_size, channels, height, width]
    pub data_path:       String,
    pub epochs:          usize,
    pub learning_rate:   f64,
    /// Weight of the KL divergence term, in [0, 1]
    pub beta:            f64,
    pub optimizer:       OptimizerKind,
    pub checkpoint_path: String,
    /// Start from existing weights instead of a fresh model
    pub pretrain:        bool,
    pub pretrain_mode:   PretrainMode,
    pub pretrain_model:  PretrainedModel,
    pub backend:         BackendKind,
    pub hidden_dim:      usize,
    pub latent_dim:      usize,
    /// Download pretrained weights even if a file is already present
    pub refresh_weights: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:       "./Data/no_sub_train.npy".to_string(),
            epochs:          50,
            learning_rate:   2e-3,
            beta:            0.0,
            optimizer:       OptimizerKind::Adam,
            checkpoint_path: "./Weights".to_string(),
            pretrain:        true,
            pretrain_mode:   PretrainMode::Transfer,
            pretrain_model:  PretrainedModel::A,
            backend:         BackendKind::Wgpu,
            hidden_dim:      1000,
            latent_dim:      1000,
            refresh_weights: false,
        }
    }
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run end to end against the configured file and remote host.
    /// Returns the per-epoch loss history.
    pub fn execute(&self) -> Result<Vec<f64>> {
        let source  = NpyLoader::new(&self.config.data_path);
        let fetcher = DriveDownloader::new(self.config.refresh_weights)?;
        self.execute_with(&source, &fetcher)
    }

    pub fn execute_with(
        &self,
        source:  &dyn ImageSource,
        fetcher: &dyn WeightsFetcher,
    ) -> Result<Vec<f64>> {
        let data = source.load()?;
        match self.config.backend {
            BackendKind::Wgpu => {
                tracing::info!("Using WGPU device");
                self.train_on::<GpuTrainBackend>(data, fetcher, &gpu_device())
            }
            BackendKind::NdArray => {
                tracing::info!("Using CPU (ndarray) device");
                self.train_on::<CpuTrainBackend>(data, fetcher, &cpu_device())
            }
        }
    }

    fn train_on<B: AutodiffBackend>(
        &self,
        data:    LensArray,
        fetcher: &dyn WeightsFetcher,
        device:  &B::Device,
    ) -> Result<Vec<f64>> {
        let cfg  = &self.config;
        let ckpt = CheckpointManager::new(&cfg.checkpoint_path)?;

        let (model, model_cfg) = if cfg.pretrain {
            restore_model::<B>(
                cfg.pretrain_mode, cfg.pretrain_model, cfg.refresh_weights,
                &ckpt, fetcher, &data, device,
            )?
        } else {
            let model_cfg = VaeConfig::new(data.channels(), data.height(), data.width())
                .with_hidden_dim(cfg.hidden_dim)
                .with_latent_dim(cfg.latent_dim);
            tracing::info!("Initialising a fresh model (latent dim {})", model_cfg.latent_dim);
            (model_cfg.init::<B>(device)?, model_cfg)
        };

        // The architecture must sit next to the weights for the next restore
        ckpt.save_config(&model_cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_path)?;

        let settings = TrainSettings {
            epochs:        cfg.epochs,
            learning_rate: cfg.learning_rate,
            beta:          cfg.beta,
            optimizer:     cfg.optimizer,
        };
        let dataset = LensDataset::new(data);
        let (_, history) = run_training(model, &dataset, &settings, &ckpt, &metrics, device)?;
        Ok(history)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, path::Path};

    /// In-memory ImageSource
    struct FixedArray(pub LensArray);

    impl ImageSource for FixedArray {
        fn load(&self) -> Result<LensArray> {
            Ok(self.0.clone())
        }
    }

    /// Fails the test if anything tries to download.
    struct NoNetwork;

    impl WeightsFetcher for NoNetwork {
        fn fetch(&self, model: PretrainedModel, _dest: &Path) -> Result<()> {
            anyhow::bail!("unexpected download of model {model}")
        }
    }

    /// Counts fetch calls and writes nothing.
    struct CountingFetcher(Cell<usize>);

    impl WeightsFetcher for CountingFetcher {
        fn fetch(&self, _model: PretrainedModel, _dest: &Path) -> Result<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    fn lens_data() -> LensArray {
        let n = 2 * 2 * 71 * 71;
        LensArray::new([2, 2, 1, 71, 71], (0..n).map(|i| (i % 5) as f32 / 5.0).collect()).unwrap()
    }

    fn cpu_config(dir: &Path) -> TrainConfig {
        TrainConfig {
            data_path:       "unused.npy".to_string(),
            epochs:          2,
            checkpoint_path: dir.display().to_string(),
            pretrain:        false,
            backend:         BackendKind::NdArray,
            hidden_dim:      4,
            latent_dim:      2,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.epochs, 50);
        assert_eq!(cfg.learning_rate, 2e-3);
        assert_eq!(cfg.beta, 0.0);
        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert!(cfg.pretrain);
        assert_eq!(cfg.pretrain_mode, PretrainMode::Transfer);
        assert_eq!(cfg.pretrain_model, PretrainedModel::A);
    }

    #[test]
    fn test_fresh_training_writes_checkpoint_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let history = TrainUseCase::new(cpu_config(dir.path()))
            .execute_with(&FixedArray(lens_data()), &NoNetwork)
            .unwrap();

        assert_eq!(history.len(), 2);
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(ckpt.has_weights());
        assert_eq!(ckpt.load_config().unwrap().latent_dim, 2);
    }

    #[test]
    fn test_continue_resumes_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        TrainUseCase::new(cpu_config(dir.path()))
            .execute_with(&FixedArray(lens_data()), &NoNetwork)
            .unwrap();

        let resumed = TrainConfig {
            pretrain:      true,
            pretrain_mode: PretrainMode::Continue,
            epochs:        1,
            ..cpu_config(dir.path())
        };
        let history = TrainUseCase::new(resumed)
            .execute_with(&FixedArray(lens_data()), &NoNetwork)
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_continue_without_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            pretrain:      true,
            pretrain_mode: PretrainMode::Continue,
            ..cpu_config(dir.path())
        };
        let err = TrainUseCase::new(cfg)
            .execute_with(&FixedArray(lens_data()), &NoNetwork)
            .unwrap_err();
        assert!(format!("{err:#}").contains("train"));
    }

    #[test]
    fn test_transfer_asks_fetcher_for_weights() {
        // fetcher writes nothing, so loading must fail after exactly one fetch
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            pretrain:       true,
            pretrain_mode:  PretrainMode::Transfer,
            pretrain_model: PretrainedModel::B,
            ..cpu_config(dir.path())
        };
        let fetcher = CountingFetcher(Cell::new(0));
        assert!(TrainUseCase::new(cfg)
            .execute_with(&FixedArray(lens_data()), &fetcher)
            .is_err());
        assert_eq!(fetcher.0.get(), 1);
    }

    #[test]
    fn test_continue_rejects_mismatched_channels() {
        let dir = tempfile::tempdir().unwrap();
        TrainUseCase::new(cpu_config(dir.path()))
            .execute_with(&FixedArray(lens_data()), &NoNetwork)
            .unwrap();

        let rgb = LensArray::new([1, 1, 3, 71, 71], vec![0.0; 3 * 71 * 71]).unwrap();
        let cfg = TrainConfig {
            pretrain:      true,
            pretrain_mode: PretrainMode::Continue,
            ..cpu_config(dir.path())
        };
        let err = TrainUseCase::new(cfg)
            .execute_with(&FixedArray(rgb), &NoNetwork)
            .unwrap_err();
        assert!(format!("{err:#}").contains("3x71x71"));
    }
}
