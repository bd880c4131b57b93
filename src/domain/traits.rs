// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits rather
// than concrete loaders or HTTP clients, so a test can swap in
// an in-memory array or a fake weights host.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::Path;

use crate::domain::{lens_array::LensArray, options::PretrainedModel};

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Anything that can produce a pre-batched lensing array.
///
/// Implementations:
///   - NpyLoader → reads a NumPy .npy file from disk
pub trait ImageSource {
    fn load(&self) -> Result<LensArray>;
}

// ─── WeightsFetcher ───────────────────────────────────────────────────────────
/// Anything that can place a published pretrained record at `dest`.
///
/// Implementations:
///   - DriveDownloader → fetches from the public file host
pub trait WeightsFetcher {
    fn fetch(&self, model: PretrainedModel, dest: &Path) -> Result<()>;
}
