pub mod chat;
pub mod client;
pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod payload;
pub mod profile;
pub mod server;
pub mod telemetry;

pub use client::{DEFAULT_ENDPOINT, DescriptionClient};
pub use config::AppConfig;
pub use download::download_hf_model;
pub use engine::{EngineCommand, EngineProcess, EngineState, EngineStatus};
pub use error::{AdapterError, ClientError, ServiceError};
pub use payload::{DescriptionResult, ImagePayload};
pub use profile::ModelProfile;
pub use server::build_router;
