// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and all
// their flags. Defaults are the values the published lensing
// experiments used.
//
// Option enums parse through their FromStr impls, so values are
// case-insensitive: `--optimizer RMSprop` works.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{ArgAction, Args, Subcommand};

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    train_use_case::TrainConfig,
};
use crate::domain::options::{BackendKind, OptimizerKind, PretrainMode, PretrainedModel};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the VAE on a batched .npy image array
    Train(TrainArgs),

    /// Reconstruct images with a trained VAE and report per-image losses
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// NumPy array of shape [n_batches, batch_size, channels, height, width]
    #[arg(long, default_value = "./Data/no_sub_train.npy")]
    pub data_path: String,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Peak learning rate of the one-cycle schedule
    #[arg(long, default_value_t = 2e-3)]
    pub learning_rate: f64,

    /// Weight of the KL-divergence loss, in [0, 1]
    #[arg(long, default_value_t = 0.0)]
    pub beta: f64,

    /// adam, rmsprop or sgd
    #[arg(long, default_value_t = OptimizerKind::Adam)]
    pub optimizer: OptimizerKind,

    /// Directory for model weights, architecture and metrics
    #[arg(long, default_value = "./Weights")]
    pub checkpoint_path: String,

    /// Continue training from preloaded weights (`--pretrain false` for a fresh model)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub pretrain: bool,

    /// transfer: download published weights; continue: load from --checkpoint-path
    #[arg(long, default_value_t = PretrainMode::Transfer)]
    pub pretrain_mode: PretrainMode,

    /// Published model to download in transfer mode (A or B)
    #[arg(long, default_value_t = PretrainedModel::A)]
    pub pretrain_model: PretrainedModel,

    /// wgpu (GPU) or ndarray (CPU)
    #[arg(long, default_value_t = BackendKind::Wgpu)]
    pub backend: BackendKind,

    /// Width of the encoder's hidden layer (fresh models only)
    #[arg(long, default_value_t = 1000)]
    pub hidden_dim: usize,

    /// Size of the latent space (fresh models only)
    #[arg(long, default_value_t = 1000)]
    pub latent_dim: usize,

    /// Download pretrained weights even if a file is already present
    #[arg(long)]
    pub refresh_weights: bool,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:       a.data_path,
            epochs:          a.epochs,
            learning_rate:   a.learning_rate,
            beta:            a.beta,
            optimizer:       a.optimizer,
            checkpoint_path: a.checkpoint_path,
            pretrain:        a.pretrain,
            pretrain_mode:   a.pretrain_mode,
            pretrain_model:  a.pretrain_model,
            backend:         a.backend,
            hidden_dim:      a.hidden_dim,
            latent_dim:      a.latent_dim,
            refresh_weights: a.refresh_weights,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// NumPy array of shape [n_batches, batch_size, channels, height, width]
    #[arg(long, default_value = "./Data/no_sub_test.npy")]
    pub data_path: String,

    /// Directory holding (or receiving) the model weights
    #[arg(long, default_value = "./Weights")]
    pub checkpoint_path: String,

    /// Directory to store reconstructed lenses and losses
    #[arg(long, default_value = "./Results")]
    pub out_path: String,

    #[arg(long, default_value_t = PretrainMode::Transfer)]
    pub pretrain_mode: PretrainMode,

    #[arg(long, default_value_t = PretrainedModel::A)]
    pub pretrain_model: PretrainedModel,

    #[arg(long, default_value_t = BackendKind::Wgpu)]
    pub backend: BackendKind,

    #[arg(long)]
    pub refresh_weights: bool,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            data_path:       a.data_path,
            checkpoint_path: a.checkpoint_path,
            out_path:        a.out_path,
            pretrain_mode:   a.pretrain_mode,
            pretrain_model:  a.pretrain_model,
            backend:         a.backend,
            refresh_weights: a.refresh_weights,
        }
    }
}
