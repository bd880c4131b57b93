// ============================================================
// Layer 4 — Lensing Array Loader
// ============================================================
// Loads the pre-batched image stack from a NumPy .npy file.
//
// Expected on-disk shape:
//   [number_of_batches, batch_size, number_of_channels, height, width]
//
// Whatever dtype was saved, values come back as f32.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::data::npy::read_npy;
use crate::domain::lens_array::LensArray;
use crate::domain::traits::ImageSource;

/// Reads a single .npy file into a LensArray.
/// Implements the ImageSource trait from Layer 3.
pub struct NpyLoader {
    path: PathBuf,
}

impl NpyLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for NpyLoader {
    fn load(&self) -> Result<LensArray> {
        let raw = read_npy(&self.path)
            .with_context(|| format!("Cannot load lensing data from '{}'", self.path.display()))?;

        let array = LensArray::from_dynamic(&raw.shape, raw.data)
            .with_context(|| format!("Bad array layout in '{}'", self.path.display()))?;

        tracing::info!(
            "Data imported: {} batches x {} images, {} channel(s), {}x{}",
            array.n_batches(),
            array.batch_size(),
            array.channels(),
            array.height(),
            array.width(),
        );
        tracing::debug!("Raw shape {:?} from '{}'", array.shape(), self.path.display());
        Ok(array)
    }
}
