use std::{path::PathBuf, process::ExitStatus, time::Duration};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures of the image submission client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Image file '{}' not found.", .0.display())]
    FileNotFound(PathBuf),
    #[error("error encoding image '{}': {source}", .path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error making API request: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API returned status code {status}")]
    Remote { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Local file problems never reach the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::FileNotFound(_) | ClientError::Encoding { .. }
        )
    }
}

/// Failures while preparing or launching the inference engine.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("HF_TOKEN is not set; an access token is required to download {model_id}")]
    MissingToken { model_id: String },
    #[error("unknown model profile '{0}'")]
    UnknownProfile(String),
    #[error("hub request failed: {0}")]
    Hub(#[from] reqwest::Error),
    #[error("hub returned status {status} for {url}")]
    HubStatus { status: u16, url: String },
    #[error("hub listed '{0}', which is not a relative path inside the model directory")]
    UnsafePath(String),
    #[error("failed to launch inference engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("inference engine exited before becoming ready ({0})")]
    EngineExited(ExitStatus),
    #[error("inference engine not ready on port {port} after {waited:?}")]
    StartupTimeout { port: u16, waited: Duration },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the description gateway routes.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("model is still loading")]
    ModelLoading,
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("inference engine unreachable: {0}")]
    EngineUnavailable(String),
    #[error("inference engine returned status {status}")]
    Upstream { status: u16, body: String },
    #[error("model execution failed: {0}")]
    Inference(String),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::ModelLoading => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::EngineUnavailable(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // the engine's own status and body go back untouched
            ServiceError::Upstream { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                return (status, body).into_response();
            }
        };

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
