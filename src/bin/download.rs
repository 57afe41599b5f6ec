//! Image build step: fetch the configured profile's weights into MODEL_ROOT.

use multimodal_llm_service::{
    AppConfig,
    download::{DEFAULT_IGNORE_PATTERNS, HubClient, snapshot},
    profile::PLATFORM_LIMITS,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env()?;
    let model_id = config.profile.model_id;
    let model_dir = config.model_dir();

    let hub = HubClient::new(model_id, config.hf_token.clone())?.with_endpoint(&config.hub_endpoint);
    let run = snapshot(&hub, &model_dir, model_id, DEFAULT_IGNORE_PATTERNS);

    match tokio::time::timeout(PLATFORM_LIMITS.download_timeout, run).await {
        Ok(Ok(summary)) => {
            tracing::info!(
                model_id,
                files = summary.downloaded.len(),
                bytes = summary.bytes,
                "download finished"
            );
            Ok(())
        }
        Ok(Err(err)) => {
            tracing::error!(model_id, %err, "download failed");
            Err(err.into())
        }
        Err(_) => {
            tracing::error!(model_id, "download timed out");
            anyhow::bail!(
                "download of {model_id} exceeded {:?}",
                PLATFORM_LIMITS.download_timeout
            )
        }
    }
}
