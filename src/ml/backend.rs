// ============================================================
// Layer 5 — Backends
// ============================================================
// Concrete backends the CLI can select:
//
//   wgpu     — GPU through WebGPU (Vulkan / Metal / DX12)
//   ndarray  — CPU, also what the unit tests run on
//
// Training needs autodiff; evaluation runs on the bare backend.

use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};

pub type GpuBackend      = Wgpu;
pub type CpuBackend      = NdArray;
pub type GpuTrainBackend = Autodiff<GpuBackend>;
pub type CpuTrainBackend = Autodiff<CpuBackend>;

pub fn gpu_device() -> WgpuDevice {
    WgpuDevice::default()
}

pub fn cpu_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}
