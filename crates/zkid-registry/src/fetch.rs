use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use zkid_types::{ZkidError, ZkidResult};

/// Source of packaged registry snapshots.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch_json(&self, url: &str) -> ZkidResult<serde_json::Value>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> ZkidResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ZkidError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SnapshotFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> ZkidResult<serde_json::Value> {
        debug!("HTTP GET: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ZkidError::Network(format!("HTTP GET failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZkidError::Network(format!("GET {} returned HTTP {}", url, status)));
        }

        response
            .json()
            .await
            .map_err(|e| ZkidError::MalformedResponse(format!("Invalid JSON from {}: {}", url, e)))
    }
}
