use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use crate::{
    engine::EngineSettings,
    error::AdapterError,
    profile::{self, DEFAULT_PROFILE, ModelProfile, PLATFORM_LIMITS},
};

pub const DEFAULT_ENGINE_PORT: u16 = 23333;
pub const DEFAULT_PROMPT: &str = "describe this image in detail";
pub const DEFAULT_HUB_ENDPOINT: &str = "https://huggingface.co";
/// Request body cap for the gateway; base64 photos are well past axum's 2 MB default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub profile: &'static ModelProfile,
    pub model_root: PathBuf,
    pub engine_program: String,
    pub engine_port: u16,
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
    pub hf_token: Option<String>,
    pub hub_endpoint: String,
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub max_body_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("SERVER_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".into())
            .parse()
            .unwrap_or_else(|_| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8000));

        let profile_name = lookup("MODEL_PROFILE").unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        let profile = profile::lookup(&profile_name)
            .ok_or_else(|| AdapterError::UnknownProfile(profile_name.clone()))?;

        let model_root =
            PathBuf::from(lookup("MODEL_ROOT").unwrap_or_else(|| "/models".to_string()));
        let engine_program = lookup("ENGINE_BIN").unwrap_or_else(|| "lmdeploy".to_string());

        let engine_port = lookup("ENGINE_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ENGINE_PORT);
        let startup_timeout = lookup("ENGINE_STARTUP_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(PLATFORM_LIMITS.startup_timeout);
        let poll_interval = lookup("ENGINE_POLL_INTERVAL_MS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_secs(1));

        let hf_token = lookup("HF_TOKEN").filter(|token| !token.trim().is_empty());
        let hub_endpoint =
            lookup("HF_ENDPOINT").unwrap_or_else(|| DEFAULT_HUB_ENDPOINT.to_string());

        let prompt = lookup("DESCRIBE_PROMPT").unwrap_or_else(|| DEFAULT_PROMPT.to_string());
        let max_tokens = lookup("MAX_TOKENS").and_then(|v| v.parse().ok());
        let max_body_bytes = lookup("MAX_BODY_BYTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        Ok(Self {
            listen_addr,
            profile,
            model_root,
            engine_program,
            engine_port,
            startup_timeout,
            poll_interval,
            hf_token,
            hub_endpoint,
            prompt,
            max_tokens,
            max_body_bytes,
        })
    }

    /// Where the profile's weights live inside the container image.
    pub fn model_dir(&self) -> PathBuf {
        self.model_root.join(self.profile.model_id)
    }

    pub fn engine_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.engine_port)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            program: self.engine_program.clone(),
            model_dir: self.model_dir(),
            port: self.engine_port,
        }
    }
}
