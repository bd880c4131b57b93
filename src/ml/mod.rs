// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model, optimiser and backend code lives here.
//
//   model.rs     — convolutional VAE: encoder, decoder,
//                  reparameterisation, MSE + beta·KL loss
//
//   scheduler.rs — one-cycle learning rate schedule
//
//   trainer.rs   — forward / backward / optimiser step per
//                  batch, checkpoint per epoch
//
//   evaluator.rs — reconstructions and per-image losses
//
//   backend.rs   — GPU (wgpu) and CPU (ndarray) backend types
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Kingma & Welling (2014) Auto-Encoding Variational Bayes

/// Convolutional VAE architecture
pub mod model;

/// One-cycle learning rate schedule
pub mod scheduler;

/// Training loop with per-epoch checkpointing
pub mod trainer;

/// Reconstruction and per-sample loss
pub mod evaluator;

/// Backend type aliases and devices
pub mod backend;
