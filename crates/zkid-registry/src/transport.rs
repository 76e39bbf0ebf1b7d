use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;
use zkid_types::{ZkidError, ZkidResult};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Read-only contract calls against a node.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Returns the raw hex `result` of an `eth_call` at the latest block.
    async fn eth_call(&self, to: &str, data: &str) -> ZkidResult<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Extracts the string result, turning node errors into `Rpc` and
    /// anything else unexpected into `MalformedResponse`.
    pub fn into_result(self) -> ZkidResult<String> {
        if let Some(error) = self.error {
            return Err(ZkidError::Rpc(format!("{} (code {})", error.message, error.code)));
        }
        match self.result {
            Some(serde_json::Value::String(result)) => Ok(result),
            Some(other) => Err(ZkidError::MalformedResponse(format!(
                "Expected hex string result, got {}",
                other
            ))),
            None => Err(ZkidError::MalformedResponse(
                "No result returned from node".into(),
            )),
        }
    }
}

pub struct HttpTransport {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> ZkidResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ZkidError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, to: &str, data: &str) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".into(),
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "eth_call".into(),
            params: serde_json::json!([{ "to": to, "data": data }, "latest"]),
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn eth_call(&self, to: &str, data: &str) -> ZkidResult<String> {
        let request = self.request(to, data);
        debug!("RPC eth_call {} -> {} ({} bytes)", self.url, to, data.len() / 2);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ZkidError::Network(format!("HTTP POST failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZkidError::Network(format!(
                "RPC endpoint returned HTTP {}",
                status
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ZkidError::MalformedResponse(format!("Failed to parse RPC response: {}", e)))?;

        body.into_result()
    }
}
