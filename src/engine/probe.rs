use std::{net::SocketAddr, time::Duration};

use async_trait::async_trait;
use tokio::net::TcpStream;

/// Answers whether the engine is accepting traffic yet.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn is_ready(&self) -> bool;
}

/// Ready once the port accepts a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: SocketAddr,
}

impl TcpProbe {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

#[async_trait]
impl ReadinessProbe for TcpProbe {
    async fn is_ready(&self) -> bool {
        TcpStream::connect(self.addr).await.is_ok()
    }
}

/// Ready once `GET url` answers with a success status. The engine binds its
/// port before the weights finish loading, so this is stricter than
/// [`TcpProbe`].
#[derive(Debug, Clone)]
pub struct HttpProbe {
    http: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(base_url: &str, path: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            url: format!("{}{}", base_url.trim_end_matches('/'), path),
        })
    }

    /// Probe against the engine's OpenAI-compatible model listing.
    pub fn models(base_url: &str) -> Result<Self, reqwest::Error> {
        Self::new(base_url, "/v1/models")
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    async fn is_ready(&self) -> bool {
        match self.http.get(&self.url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::trace!(url = %self.url, %err, "readiness probe failed");
                false
            }
        }
    }
}
