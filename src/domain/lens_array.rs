// ============================================================
// Layer 3 — LensArray Domain Type
// ============================================================
// The lensing data arrives pre-batched on disk:
//
//   [n_batches, batch_size, channels, height, width]
//
// Every stored batch is fed to the model exactly as it was
// written, so the batch grouping is part of the data, not a
// training hyperparameter. Values are kept row-major (C order)
// in one flat Vec<f32>, which makes a batch or a single sample
// a contiguous slice.
//
// Reference: NumPy C-order memory layout
//            Rust Book §8 (Vectors), §9 (Error Handling)

use anyhow::{anyhow, ensure, Result};

/// Number of axes a lensing array must have.
pub const LENS_RANK: usize = 5;

/// A pre-batched stack of lensing images in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct LensArray {
    shape: [usize; LENS_RANK],
    data:  Vec<f32>,
}

impl LensArray {
    /// Build a LensArray, checking the flat buffer matches the shape.
    ///
    /// Only the batch count may be zero; an empty image axis would
    /// reach the model as a zero-sized tensor.
    pub fn new(shape: [usize; LENS_RANK], data: Vec<f32>) -> Result<Self> {
        ensure!(
            shape[1..].iter().all(|&d| d > 0),
            "lens array shape {:?} has an empty batch or image axis",
            shape
        );
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| anyhow!("lens array shape {:?} is too large to address", shape))?;
        ensure!(
            data.len() == expected,
            "lens array shape {:?} needs {} values, got {}",
            shape, expected, data.len()
        );
        Ok(Self { shape, data })
    }

    /// Convert an arbitrary-rank shape into a lensing array, failing
    /// with the offending shape when it is not 5-D.
    pub fn from_dynamic(shape: &[usize], data: Vec<f32>) -> Result<Self> {
        ensure!(
            shape.len() == LENS_RANK,
            "expected a 5-D array [n_batches, batch_size, channels, height, width], got shape {:?}",
            shape
        );
        let mut fixed = [0usize; LENS_RANK];
        fixed.copy_from_slice(shape);
        Self::new(fixed, data)
    }

    pub fn shape(&self) -> [usize; LENS_RANK] { self.shape }

    pub fn n_batches(&self)  -> usize { self.shape[0] }
    pub fn batch_size(&self) -> usize { self.shape[1] }
    pub fn channels(&self)   -> usize { self.shape[2] }
    pub fn height(&self)     -> usize { self.shape[3] }
    pub fn width(&self)      -> usize { self.shape[4] }

    /// Values in one image: channels * height * width
    pub fn sample_len(&self) -> usize {
        self.channels() * self.height() * self.width()
    }

    /// Total images across every batch
    pub fn n_samples(&self) -> usize {
        self.n_batches() * self.batch_size()
    }

    /// Contiguous values of stored batch `index`.
    pub fn batch(&self, index: usize) -> &[f32] {
        let len   = self.batch_size() * self.sample_len();
        let start = index * len;
        &self.data[start..start + len]
    }

    /// Contiguous values of flattened sample `index`
    /// (batches concatenated in storage order).
    pub fn sample(&self, index: usize) -> &[f32] {
        let len   = self.sample_len();
        let start = index * len;
        &self.data[start..start + len]
    }

    /// Shape once the batch axis is merged into the sample axis.
    pub fn flattened_shape(&self) -> [usize; 4] {
        [self.n_samples(), self.channels(), self.height(), self.width()]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
