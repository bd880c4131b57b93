use anyhow::{ensure, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        loss::{MseLoss, Reduction},
        Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::{activation, Distribution},
};

/// Every conv / conv-transpose in the network uses a 7x7 kernel.
pub const KERNEL: usize = 7;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct VaeConfig {
    /// Image channels, taken from the data
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
    /// Output channels of the three encoder convolutions
    #[config(default = "[16, 32, 64]")]
    pub widths: [usize; 3],
    #[config(default = 1000)]
    pub hidden_dim: usize,
    #[config(default = 1000)]
    pub latent_dim: usize,
}

/// Spatial size after each encoder convolution, as [height, width].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSizes {
    pub conv1: [usize; 2],
    pub conv2: [usize; 2],
    pub conv3: [usize; 2],
}

/// Output length of a convolution, None if the kernel does not fit.
fn conv_out(input: usize, stride: usize, padding: usize) -> Option<usize> {
    let padded = input + 2 * padding;
    (padded >= KERNEL).then(|| (padded - KERNEL) / stride + 1)
}

/// Output padding that makes a stride-3, pad-1 transpose conv
/// land exactly on `target` from `input`.
fn padding_out(input: usize, target: usize) -> usize {
    // (input - 1) * 3 - 2 + KERNEL = 3 * input + 2
    target - (3 * input + 2)
}

impl VaeConfig {
    pub fn feature_sizes(&self) -> Result<FeatureSizes> {
        let side = |n: usize| -> Option<[usize; 3]> {
            let a = conv_out(n, 3, 1)?;
            let b = conv_out(a, 3, 1)?;
            let c = conv_out(b, 1, 0)?;
            Some([a, b, c])
        };
        let (h, w) = side(self.height).zip(side(self.width)).ok_or_else(|| {
            anyhow::anyhow!(
                "images of {}x{} are too small for the encoder (minimum 71x71)",
                self.height, self.width
            )
        })?;
        Ok(FeatureSizes {
            conv1: [h[0], w[0]],
            conv2: [h[1], w[1]],
            conv3: [h[2], w[2]],
        })
    }

    /// Length of the flattened encoder output.
    pub fn flat_dim(&self) -> Result<usize> {
        let [h, w] = self.feature_sizes()?.conv3;
        Ok(self.widths[2] * h * w)
    }

    /// Whether this architecture accepts images shaped [channels, height, width].
    pub fn check_input(&self, channels: usize, height: usize, width: usize) -> Result<()> {
        ensure!(
            self.channels == channels && self.height == height && self.width == width,
            "model expects {}x{}x{} images but the data holds {}x{}x{}",
            self.channels, self.height, self.width, channels, height, width
        );
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Vae<B>> {
        ensure!(self.channels > 0, "images must have at least one channel");
        let sizes = self.feature_sizes()?;
        let flat  = self.flat_dim()?;
        let [w1, w2, w3] = self.widths;

        let encoder = Encoder {
            conv1: Conv2dConfig::new([self.channels, w1], [KERNEL, KERNEL])
                .with_stride([3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv2: Conv2dConfig::new([w1, w2], [KERNEL, KERNEL])
                .with_stride([3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv3: Conv2dConfig::new([w2, w3], [KERNEL, KERNEL]).init(device),
            hidden:  LinearConfig::new(flat, self.hidden_dim).init(device),
            mu:      LinearConfig::new(self.hidden_dim, self.latent_dim).init(device),
            log_var: LinearConfig::new(self.hidden_dim, self.latent_dim).init(device),
        };

        let decoder = Decoder {
            project: LinearConfig::new(self.latent_dim, flat).init(device),
            // stride 1, no padding: exactly undoes conv3
            up1: ConvTranspose2dConfig::new([w3, w2], [KERNEL, KERNEL]).init(device),
            up2: ConvTranspose2dConfig::new([w2, w1], [KERNEL, KERNEL])
                .with_stride([3, 3])
                .with_padding([1, 1])
                .with_padding_out([
                    padding_out(sizes.conv2[0], sizes.conv1[0]),
                    padding_out(sizes.conv2[1], sizes.conv1[1]),
                ])
                .init(device),
            up3: ConvTranspose2dConfig::new([w1, self.channels], [KERNEL, KERNEL])
                .with_stride([3, 3])
                .with_padding([1, 1])
                .with_padding_out([
                    padding_out(sizes.conv1[0], self.height),
                    padding_out(sizes.conv1[1], self.width),
                ])
                .init(device),
            feature_channels: w3,
            feature_height:   sizes.conv3[0],
            feature_width:    sizes.conv3[1],
        };

        Ok(Vae { encoder, decoder })
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub conv1:   Conv2d<B>,
    pub conv2:   Conv2d<B>,
    pub conv3:   Conv2d<B>,
    pub hidden:  Linear<B>,
    pub mu:      Linear<B>,
    pub log_var: Linear<B>,
}

impl<B: Backend> Encoder<B> {
    /// images: [batch, c, h, w] → (mu, log_var): [batch, latent]
    pub fn forward(&self, images: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let x = activation::relu(self.conv1.forward(images));
        let x = activation::relu(self.conv2.forward(x));
        let x = activation::relu(self.conv3.forward(x));
        let h = self.hidden.forward(x.flatten::<2>(1, 3));
        (self.mu.forward(h.clone()), self.log_var.forward(h))
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub project: Linear<B>,
    pub up1:     ConvTranspose2d<B>,
    pub up2:     ConvTranspose2d<B>,
    pub up3:     ConvTranspose2d<B>,
    pub feature_channels: usize,
    pub feature_height:   usize,
    pub feature_width:    usize,
}

impl<B: Backend> Decoder<B> {
    /// z: [batch, latent] → reconstruction in [0, 1]: [batch, c, h, w]
    pub fn forward(&self, z: Tensor<B, 2>) -> Tensor<B, 4> {
        let [batch_size, _] = z.dims();
        let x = activation::relu(self.project.forward(z)).reshape([
            batch_size,
            self.feature_channels,
            self.feature_height,
            self.feature_width,
        ]);
        let x = activation::relu(self.up1.forward(x));
        let x = activation::relu(self.up2.forward(x));
        activation::sigmoid(self.up3.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct Vae<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
}

pub struct VaeOutput<B: Backend> {
    pub reconstruction: Tensor<B, 4>,
    pub mu:             Tensor<B, 2>,
    pub log_var:        Tensor<B, 2>,
}

impl<B: Backend> Vae<B> {
    pub fn forward(&self, images: Tensor<B, 4>) -> VaeOutput<B> {
        let (mu, log_var) = self.encoder.forward(images);

        // Reparameterisation: z = mu + eps * sigma keeps sampling differentiable
        let std = log_var.clone().div_scalar(2.0).exp();
        let eps = Tensor::<B, 2>::random(std.dims(), Distribution::Normal(0.0, 1.0), &std.device());
        let z   = mu.clone() + eps * std;

        VaeOutput {
            reconstruction: self.decoder.forward(z),
            mu,
            log_var,
        }
    }

    /// loss = MSE(recon, images) + beta * KL(q(z|x) || N(0, I))
    pub fn forward_loss(&self, images: Tensor<B, 4>, beta: f64) -> (Tensor<B, 1>, VaeOutput<B>) {
        let output = self.forward(images.clone());
        let mse = MseLoss::new().forward(output.reconstruction.clone(), images, Reduction::Mean);
        let kl  = kl_divergence(output.mu.clone(), output.log_var.clone());
        (mse + kl.mul_scalar(beta), output)
    }
}

/// -0.5 * Σ(1 + log_var - mu² - exp(log_var)), summed over batch and latent.
pub fn kl_divergence<B: Backend>(mu: Tensor<B, 2>, log_var: Tensor<B, 2>) -> Tensor<B, 1> {
    (log_var.clone().add_scalar(1.0) - mu.powf_scalar(2.0) - log_var.exp())
        .sum()
        .mul_scalar(-0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    type TestBackend = NdArray;

    fn tiny(channels: usize, height: usize, width: usize) -> VaeConfig {
        VaeConfig::new(channels, height, width)
            .with_widths([2, 3, 4])
            .with_hidden_dim(8)
            .with_latent_dim(4)
    }

    #[test]
    fn test_feature_sizes_for_150px() {
        let cfg = VaeConfig::new(1, 150, 150);
        let sizes = cfg.feature_sizes().unwrap();
        assert_eq!(sizes.conv1, [49, 49]);
        assert_eq!(sizes.conv2, [15, 15]);
        assert_eq!(sizes.conv3, [9, 9]);
        assert_eq!(cfg.flat_dim().unwrap(), 5184);
    }

    #[test]
    fn test_too_small_image_is_rejected() {
        assert!(VaeConfig::new(1, 70, 150).feature_sizes().is_err());
        assert!(VaeConfig::new(1, 71, 71).feature_sizes().is_ok());
    }

    #[test]
    fn test_padding_out_stays_below_stride() {
        for n in 71..200 {
            let s = VaeConfig::new(1, n, n).feature_sizes().unwrap();
            assert!(padding_out(s.conv1[0], n) < 3);
            assert!(padding_out(s.conv2[0], s.conv1[0]) < 3);
        }
    }

    #[test]
    fn test_reconstruction_matches_input_shape() {
        let device = NdArrayDevice::Cpu;
        for (h, w) in [(71, 71), (73, 80)] {
            let model: Vae<TestBackend> = tiny(2, h, w).init(&device).unwrap();
            let images = Tensor::<TestBackend, 4>::zeros([3, 2, h, w], &device);
            let out = model.forward(images);
            assert_eq!(out.reconstruction.dims(), [3, 2, h, w]);
            assert_eq!(out.mu.dims(), [3, 4]);
            assert_eq!(out.log_var.dims(), [3, 4]);
        }
    }

    #[test]
    fn test_reconstruction_is_in_unit_range() {
        let device = NdArrayDevice::Cpu;
        let model: Vae<TestBackend> = tiny(1, 71, 71).init(&device).unwrap();
        let images = Tensor::<TestBackend, 4>::random(
            [2, 1, 71, 71], Distribution::Uniform(0.0, 1.0), &device,
        );
        let values = model.forward(images).reconstruction.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_kl_is_zero_for_standard_normal() {
        let device = NdArrayDevice::Cpu;
        let mu      = Tensor::<TestBackend, 2>::zeros([2, 5], &device);
        let log_var = Tensor::<TestBackend, 2>::zeros([2, 5], &device);
        let kl: f32 = kl_divergence(mu, log_var).into_scalar().elem();
        assert!(kl.abs() < 1e-6);
    }

    #[test]
    fn test_kl_sums_over_batch() {
        // mu = 1, log_var = 0 → each entry contributes 0.5
        let device = NdArrayDevice::Cpu;
        let mu      = Tensor::<TestBackend, 2>::ones([2, 3], &device);
        let log_var = Tensor::<TestBackend, 2>::zeros([2, 3], &device);
        let kl: f32 = kl_divergence(mu, log_var).into_scalar().elem();
        assert!((kl - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_beta_loss_is_plain_mse() {
        let device = NdArrayDevice::Cpu;
        let model: Vae<TestBackend> = tiny(1, 71, 71).init(&device).unwrap();
        let images = Tensor::<TestBackend, 4>::ones([1, 1, 71, 71], &device);
        let (loss, out) = model.forward_loss(images.clone(), 0.0);

        let expected: f32 = (out.reconstruction - images).powf_scalar(2.0).mean().into_scalar().elem();
        let loss: f32 = loss.into_scalar().elem();
        assert!((loss - expected).abs() < 1e-6);
    }

    #[test]
    fn test_check_input_reports_mismatch() {
        let cfg = VaeConfig::new(1, 150, 150);
        assert!(cfg.check_input(1, 150, 150).is_ok());
        let err = cfg.check_input(3, 150, 150).unwrap_err();
        assert!(err.to_string().contains("3x150x150"));
    }
}
