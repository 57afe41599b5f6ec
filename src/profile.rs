//! Model profiles served by this deployment and the parameters handed to the
//! hosting platform. One adapter is parameterised by a profile instead of
//! keeping a copy of the launcher per model.

use std::{collections::HashMap, fmt, time::Duration};

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuClass {
    A10G,
    L40S,
    A100 { memory_gb: u16 },
    H100,
}

impl fmt::Display for GpuClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuClass::A10G => f.write_str("A10G"),
            GpuClass::L40S => f.write_str("L40S"),
            GpuClass::A100 { memory_gb } => write!(f, "A100-{memory_gb}GB"),
            GpuClass::H100 => f.write_str("H100"),
        }
    }
}

impl Serialize for GpuClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GpuSpec {
    pub class: GpuClass,
    pub count: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightFormat {
    /// Plain Hugging Face checkpoint, the engine picks the dtype.
    Hf,
    /// 4-bit AWQ weights.
    Awq,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelProfile {
    /// Short name used by `MODEL_PROFILE` and as the served model name.
    pub name: &'static str,
    /// Hugging Face repository id.
    pub model_id: &'static str,
    pub gpu: GpuSpec,
    pub tensor_parallel: u8,
    /// Maximum context length of a session, in tokens.
    pub session_len: u32,
    /// Fraction of free GPU memory the engine may reserve for the KV cache.
    pub cache_max_entry_count: f32,
    pub chat_template: Option<&'static str>,
    pub weight_format: WeightFormat,
    pub prefix_caching: bool,
}

pub const DEFAULT_PROFILE: &str = "internvl2_5-78b";

pub static PROFILES: &[ModelProfile] = &[
    ModelProfile {
        name: "internvl2_5-78b",
        model_id: "OpenGVLab/InternVL2_5-78B",
        gpu: GpuSpec {
            class: GpuClass::A100 { memory_gb: 80 },
            count: 1,
        },
        tensor_parallel: 1,
        session_len: 8192,
        cache_max_entry_count: 0.8,
        chat_template: None,
        weight_format: WeightFormat::Hf,
        prefix_caching: false,
    },
    ModelProfile {
        name: "internvl3-8b",
        model_id: "OpenGVLab/InternVL3-8B",
        gpu: GpuSpec {
            class: GpuClass::L40S,
            count: 1,
        },
        tensor_parallel: 1,
        session_len: 8192,
        cache_max_entry_count: 0.8,
        chat_template: Some("internvl2_5"),
        weight_format: WeightFormat::Hf,
        prefix_caching: true,
    },
    ModelProfile {
        name: "internvl3-38b-awq",
        model_id: "OpenGVLab/InternVL3-38B-AWQ",
        gpu: GpuSpec {
            class: GpuClass::A100 { memory_gb: 80 },
            count: 1,
        },
        tensor_parallel: 1,
        session_len: 16384,
        cache_max_entry_count: 0.9,
        chat_template: Some("internvl2_5"),
        weight_format: WeightFormat::Awq,
        prefix_caching: true,
    },
    ModelProfile {
        name: "internvl3-78b",
        model_id: "OpenGVLab/InternVL3-78B",
        gpu: GpuSpec {
            class: GpuClass::H100,
            count: 2,
        },
        tensor_parallel: 2,
        session_len: 16384,
        cache_max_entry_count: 0.8,
        chat_template: Some("internvl2_5"),
        weight_format: WeightFormat::Hf,
        prefix_caching: true,
    },
];

static REGISTRY: Lazy<HashMap<&'static str, &'static ModelProfile>> =
    Lazy::new(|| PROFILES.iter().map(|p| (p.name, p)).collect());

pub fn lookup(name: &str) -> Option<&'static ModelProfile> {
    REGISTRY.get(name).copied()
}

/// Container parameters consumed by the hosting platform. Nothing in this
/// crate enforces them; they are reported and used as startup budgets.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlatformLimits {
    pub container_idle_timeout: Duration,
    pub concurrency_limit: u32,
    pub max_concurrent_inputs: u32,
    pub startup_timeout: Duration,
    pub download_timeout: Duration,
}

pub const PLATFORM_LIMITS: PlatformLimits = PlatformLimits {
    container_idle_timeout: Duration::from_secs(20 * 60),
    concurrency_limit: 1,
    max_concurrent_inputs: 256,
    startup_timeout: Duration::from_secs(60 * 60),
    download_timeout: Duration::from_secs(60 * 60),
};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheVolume {
    pub name: &'static str,
    pub mount: &'static str,
}

pub const CACHE_VOLUMES: &[CacheVolume] = &[
    CacheVolume {
        name: "huggingface-cache",
        mount: "/root/.cache/huggingface",
    },
    CacheVolume {
        name: "lmdeploy-cache",
        mount: "/root/.cache/lmdeploy",
    },
];
