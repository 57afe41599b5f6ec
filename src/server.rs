use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    chat::{ChatCompletionRequest, ChatCompletionResponse},
    config::AppConfig,
    engine::{EngineState, EngineStatus},
    error::ServiceError,
    payload::{DescribeRequest, DescriptionResult, ImagePayload},
    profile::{CACHE_VOLUMES, CacheVolume, ModelProfile, PLATFORM_LIMITS, PlatformLimits},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: EngineStatus,
    pub upstream: Arc<EngineClient>,
}

#[derive(Serialize)]
struct MetadataResponse {
    profile: &'static ModelProfile,
    engine: EngineState,
    engine_port: u16,
    platform: PlatformLimits,
    volumes: &'static [CacheVolume],
}

/// Forwards description requests to the engine's chat-completion API. The
/// engine runs in the same container, so proxies are bypassed.
pub struct EngineClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl EngineClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub async fn describe(
        &self,
        image: &ImagePayload,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<String, ServiceError> {
        let request =
            ChatCompletionRequest::describe_image(&self.model, prompt, image.to_data_url(), max_tokens);
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::EngineUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::EngineUnavailable(e.to_string()))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "engine rejected request");
            return Err(ServiceError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::Inference(format!("unreadable engine response: {e}")))?;
        completion
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Inference("engine returned no completion".into()))
    }
}

pub fn build_router(
    config: Arc<AppConfig>,
    engine: EngineStatus,
) -> Result<Router, reqwest::Error> {
    let upstream = Arc::new(EngineClient::new(
        config.engine_base_url(),
        config.profile.name,
    )?);
    let body_limit = DefaultBodyLimit::max(config.max_body_bytes);
    let state = AppState {
        config,
        engine,
        upstream,
    };

    let router = Router::new()
        .route("/", post(describe))
        .route("/describe", post(describe))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metadata", get(metadata))
        .with_state(state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());
    Ok(router)
}

async fn health() -> &'static str {
    "ok"
}

async fn ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.engine.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "starting")
    }
}

async fn describe(
    State(state): State<AppState>,
    Json(request): Json<DescribeRequest>,
) -> Result<Json<DescriptionResult>, ServiceError> {
    if !state.engine.is_ready() {
        return Err(ServiceError::ModelLoading);
    }

    let image = ImagePayload::from_base64(&request.image_data)
        .map_err(|e| ServiceError::BadRequest(format!("image_data is not base64: {e}")))?;
    if image.is_empty() {
        return Err(ServiceError::BadRequest("image_data is empty".into()));
    }

    info!(bytes = image.bytes().len(), mime = image.mime_type(), "describing image");
    let description = state
        .upstream
        .describe(&image, &state.config.prompt, state.config.max_tokens)
        .await?;

    Ok(Json(DescriptionResult { description }))
}

async fn metadata(State(state): State<AppState>) -> Json<MetadataResponse> {
    Json(MetadataResponse {
        profile: state.config.profile,
        engine: state.engine.get(),
        engine_port: state.config.engine_port,
        platform: PLATFORM_LIMITS,
        volumes: CACHE_VOLUMES,
    })
}
