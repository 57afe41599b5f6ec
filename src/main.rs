use std::sync::Arc;

use tokio::net::TcpListener;

use multimodal_llm_service::{
    AppConfig, EngineCommand, EngineProcess, build_router, engine::HttpProbe,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(
        profile = config.profile.name,
        model_dir = %config.model_dir().display(),
        "launching inference engine"
    );

    let command = EngineCommand::lmdeploy(config.profile, &config.engine_settings());
    let mut engine = EngineProcess::spawn(&command)?;

    let router = build_router(config.clone(), engine.status())?;
    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "description gateway listening");
    let mut server = tokio::spawn(async move { axum::serve(listener, router).await });

    let probe = HttpProbe::models(&config.engine_base_url())?;
    engine
        .wait_until_ready(&probe, config.startup_timeout, config.poll_interval)
        .await?;

    tokio::select! {
        status = engine.wait() => {
            let status = status?;
            tracing::error!(%status, "inference engine exited");
            server.abort();
            anyhow::bail!("inference engine exited: {status}");
        }
        served = &mut server => {
            served??;
            Ok(())
        }
    }
}
