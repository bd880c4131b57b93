use burn::data::dataset::Dataset;

use crate::domain::lens_array::LensArray;

/// One lensing image, channels-first.
#[derive(Debug, Clone, PartialEq)]
pub struct LensImage {
    /// Row-major values, length channels * height * width
    pub pixels: Vec<f32>,
    /// [channels, height, width]
    pub shape:  [usize; 3],
}

/// Burn dataset view over a LensArray. Indexing walks the
/// flattened sample axis; `batches()` keeps the stored grouping.
pub struct LensDataset {
    array: LensArray,
}

impl LensDataset {
    pub fn new(array: LensArray) -> Self { Self { array } }

    pub fn array(&self) -> &LensArray { &self.array }

    pub fn n_batches(&self) -> usize { self.array.n_batches() }

    /// Stored batch `index` as individual images.
    pub fn batch(&self, index: usize) -> Vec<LensImage> {
        let shape = [self.array.channels(), self.array.height(), self.array.width()];
        self.array
            .batch(index)
            .chunks_exact(self.array.sample_len().max(1))
            .map(|pixels| LensImage { pixels: pixels.to_vec(), shape })
            .collect()
    }

    /// Stored batches in file order. No shuffling.
    pub fn batches(&self) -> impl Iterator<Item = Vec<LensImage>> + '_ {
        (0..self.n_batches()).map(move |i| self.batch(i))
    }
}

impl Dataset<LensImage> for LensDataset {
    fn get(&self, index: usize) -> Option<LensImage> {
        if index >= self.array.n_samples() {
            return None;
        }
        Some(LensImage {
            pixels: self.array.sample(index).to_vec(),
            shape:  [self.array.channels(), self.array.height(), self.array.width()],
        })
    }

    fn len(&self) -> usize {
        self.array.n_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> LensDataset {
        // 3 batches of 2 images, each 1x1x2
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        LensDataset::new(LensArray::new([3, 2, 1, 1, 2], data).unwrap())
    }

    #[test]
    fn test_len_counts_every_image() {
        assert_eq!(dataset().len(), 6);
    }

    #[test]
    fn test_get_walks_flattened_samples() {
        let ds = dataset();
        assert_eq!(ds.get(3).unwrap().pixels, vec![6.0, 7.0]);
        assert!(ds.get(6).is_none());
    }

    #[test]
    fn test_batches_keep_storage_order() {
        let batches: Vec<_> = dataset().batches().collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2][0].pixels, vec![8.0, 9.0]);
        assert_eq!(batches[2][1].shape, [1, 1, 2]);
    }
}
