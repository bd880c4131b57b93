// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One optimiser step per stored batch, one checkpoint per epoch.
//
//   for epoch in 1..=epochs
//     for batch in stored order
//       forward → MSE + beta·KL → backward → optimiser step
//       (learning rate from the one-cycle schedule, advanced per batch)
//     epoch loss = Σ(batch loss × batch size) / number of batches
//     save weights, append metrics row
//
// The optimiser is chosen at runtime, so the loop itself is
// generic over Burn's Optimizer trait and the match below only
// picks the concrete type.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    optim::{
        decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer, RmsPropConfig,
        SgdConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::data::{batcher::LensBatcher, dataset::LensDataset};
use crate::domain::options::OptimizerKind;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{model::Vae, scheduler::OneCycleLr};

/// L2 penalty applied by every optimiser choice.
pub const WEIGHT_DECAY: f32 = 1e-5;

/// Denominator guard for Adam and RMSprop.
pub const EPSILON: f32 = 1e-8;

#[derive(Debug, Clone)]
pub struct TrainSettings {
    pub epochs:        usize,
    /// Peak rate of the one-cycle schedule
    pub learning_rate: f64,
    /// Weight of the KL term
    pub beta:          f64,
    pub optimizer:     OptimizerKind,
}

/// Train `model` on every stored batch of `dataset`.
/// Returns the trained model and the per-epoch loss history.
pub fn run_training<B: AutodiffBackend>(
    model:    Vae<B>,
    dataset:  &LensDataset,
    settings: &TrainSettings,
    ckpt:     &CheckpointManager,
    metrics:  &MetricsLogger,
    device:   &B::Device,
) -> Result<(Vae<B>, Vec<f64>)> {
    tracing::info!("Optimizer: {}, weight decay {:e}", settings.optimizer, WEIGHT_DECAY);

    match settings.optimizer {
        OptimizerKind::Adam => {
            let optim = adam_config().init::<B, Vae<B>>();
            fit(model, optim, dataset, settings, ckpt, metrics, device)
        }
        OptimizerKind::RmsProp => {
            let optim = rmsprop_config().init::<B, Vae<B>>();
            fit(model, optim, dataset, settings, ckpt, metrics, device)
        }
        OptimizerKind::Sgd => {
            let optim = sgd_config().init::<B, Vae<B>>();
            fit(model, optim, dataset, settings, ckpt, metrics, device)
        }
    }
}

// ── Optimiser settings ────────────────────────────────────────────────────────
// θ = θ - lr * m / (√v + ε), with L2 decay folded into the gradient
fn adam_config() -> AdamConfig {
    AdamConfig::new()
        .with_epsilon(EPSILON)
        .with_weight_decay(Some(WeightDecayConfig::new(WEIGHT_DECAY)))
}

fn rmsprop_config() -> RmsPropConfig {
    RmsPropConfig::new()
        .with_epsilon(EPSILON)
        .with_weight_decay(Some(WeightDecayConfig::new(WEIGHT_DECAY)))
}

fn sgd_config() -> SgdConfig {
    SgdConfig::new().with_weight_decay(Some(WeightDecayConfig::new(WEIGHT_DECAY)))
}

fn fit<B, O>(
    mut model: Vae<B>,
    mut optim: O,
    dataset:   &LensDataset,
    settings:  &TrainSettings,
    ckpt:      &CheckpointManager,
    metrics:   &MetricsLogger,
    device:    &B::Device,
) -> Result<(Vae<B>, Vec<f64>)>
where
    B: AutodiffBackend,
    O: Optimizer<Vae<B>, B>,
{
    let n_batches = dataset.n_batches();
    let batcher   = LensBatcher::<B>::new(device.clone());
    let mut schedule = OneCycleLr::new(settings.learning_rate, settings.epochs, n_batches);
    let mut history  = Vec::with_capacity(settings.epochs);

    let progress = ProgressBar::new(settings.epochs as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} epochs [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    tracing::info!(
        "Training the model: {} epochs x {} batches ({} steps), max lr {:e}, beta {}",
        settings.epochs, n_batches, schedule.total_steps(), settings.learning_rate, settings.beta
    );

    for epoch in 1..=settings.epochs {
        let mut loss_sum = 0.0f64;
        let mut last_lr  = schedule.current_lr();

        for items in dataset.batches() {
            let batch_size = items.len();
            let batch = batcher.batch(items);

            let (loss, _) = model.forward_loss(batch.images, settings.beta);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            last_lr   = schedule.step();
            model     = optim.step(last_lr, model, grads);

            loss_sum += loss_val * batch_size as f64;
        }

        let epoch_loss = if n_batches > 0 { loss_sum / n_batches as f64 } else { 0.0 };
        if !epoch_loss.is_finite() {
            tracing::warn!("Epoch {} loss is {}; consider a lower learning rate", epoch, epoch_loss);
        }
        history.push(epoch_loss);

        ckpt.save_model(&model)?;
        metrics.log(&EpochMetrics::new(epoch, epoch_loss, last_lr))?;

        progress.set_message(format!("loss={epoch_loss:.6}"));
        progress.inc(1);
        tracing::debug!("Epoch {}/{} | loss={:.6} | lr={:.3e}", epoch, settings.epochs, epoch_loss, last_lr);
    }

    progress.finish_and_clear();
    tracing::info!("Training complete");
    Ok((model, history))
}
