// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by more than one workflow:
//
//   checkpoint.rs — VAE weights (Burn CompactRecorder) plus the
//                   architecture JSON needed to rebuild the model
//
//   metrics.rs    — per-epoch loss and learning rate, as CSV
//
//   downloader.rs — fetches published pretrained weights from
//                   the remote file host
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Pretrained weights download
pub mod downloader;
