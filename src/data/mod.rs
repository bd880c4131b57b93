// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a .npy file on disk to tensor batches:
//
//   .npy file
//       │
//       ▼
//   npy::read_npy     → raw shape + values cast to f32
//       │
//       ▼
//   NpyLoader         → checks the 5-D batched layout
//       │
//       ▼
//   LensDataset       → implements Burn's Dataset trait,
//       │               yields stored batches in order
//       ▼
//   LensBatcher       → stacks images into [N, C, H, W]
//
// The npy codec also writes reconstructions and losses back out.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// NumPy .npy reader / writer
pub mod npy;

/// Loads the batched image stack through the ImageSource trait
pub mod loader;

/// Implements Burn's Dataset trait for lensing images
pub mod dataset;

/// Implements Burn's Batcher trait to create image tensors
pub mod batcher;
