// ============================================================
// Layer 3 — Run Options
// ============================================================
// Small closed sets of choices a user makes on the command line.
// Each option parses case-insensitively from a string (so clap
// can use FromStr directly) and round-trips through serde so it
// can be stored alongside a training config.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Which optimiser drives the weight updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    RmsProp,
    Sgd,
}

impl FromStr for OptimizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam"    => Ok(Self::Adam),
            "rmsprop" => Ok(Self::RmsProp),
            "sgd"     => Ok(Self::Sgd),
            other     => Err(format!(
                "unknown optimizer '{other}', expected one of: adam, rmsprop, sgd"
            )),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Adam    => "adam",
            Self::RmsProp => "rmsprop",
            Self::Sgd     => "sgd",
        })
    }
}

/// Where pretrained weights come from.
///
/// `Transfer` fetches a published model from the remote host,
/// `Continue` resumes from whatever is in the checkpoint directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PretrainMode {
    Transfer,
    Continue,
}

impl FromStr for PretrainMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transfer" => Ok(Self::Transfer),
            "continue" => Ok(Self::Continue),
            other      => Err(format!(
                "unknown pretrain mode '{other}', expected 'transfer' or 'continue'"
            )),
        }
    }
}

impl fmt::Display for PretrainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transfer => "transfer",
            Self::Continue => "continue",
        })
    }
}

/// The two published pretrained VAEs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PretrainedModel {
    A,
    B,
}

impl FromStr for PretrainedModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A"   => Ok(Self::A),
            "B"   => Ok(Self::B),
            other => Err(format!("unknown pretrained model '{other}', expected 'A' or 'B'")),
        }
    }
}

impl fmt::Display for PretrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
        })
    }
}

/// Compute backend the tensors live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GPU through WebGPU (Vulkan / Metal / DX12)
    Wgpu,
    /// Pure-Rust CPU backend
    NdArray,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgpu" | "gpu"           => Ok(Self::Wgpu),
            "ndarray" | "cpu"        => Ok(Self::NdArray),
            other                    => Err(format!(
                "unknown backend '{other}', expected 'wgpu' or 'ndarray'"
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wgpu    => "wgpu",
            Self::NdArray => "ndarray",
        })
    }
}
