// ============================================================
// Layer 4 — Lens Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<LensImage> into
// a single channels-first image tensor on the target device.
//
// How batching works here:
//   Input:  N LensImages, each [C, H, W]
//   Output: LensBatch with images of shape [N, C, H, W]
//
//   Pixels are concatenated in order, then reshaped. Every image
//   in a stored batch has the same shape, so no padding is needed.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::LensImage;

/// A batch of lensing images ready for the VAE forward pass.
#[derive(Debug, Clone)]
pub struct LensBatch<B: Backend> {
    /// [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,
}

/// Holds the target device so tensors are created on the
/// correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct LensBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> LensBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<LensImage, LensBatch<B>> for LensBatcher<B> {
    fn batch(&self, items: Vec<LensImage>) -> LensBatch<B> {
        let batch_size = items.len();
        let [channels, height, width] = items
            .first()
            .map(|img| img.shape)
            .unwrap_or([0, 0, 0]);

        let flat: Vec<f32> = items
            .into_iter()
            .flat_map(|img| img.pixels)
            .collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(flat, [batch_size, channels, height, width]),
            &self.device,
        );

        LensBatch { images }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    #[test]
    fn test_batch_shape_and_order() {
        let batcher = LensBatcher::<NdArray>::new(NdArrayDevice::Cpu);
        let items = vec![
            LensImage { pixels: vec![1.0, 2.0, 3.0, 4.0], shape: [1, 2, 2] },
            LensImage { pixels: vec![5.0, 6.0, 7.0, 8.0], shape: [1, 2, 2] },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, 1, 2, 2]);

        let values = batch.images.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }
}
