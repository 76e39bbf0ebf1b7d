use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZkidError {
    /// Transport-level failure (connection refused, timeout, non-2xx status).
    #[error("Network error: {0}")]
    Network(String),

    /// Well-formed JSON-RPC error object returned by the node.
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Fetched data parsed correctly but does not hash to the trusted root.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ZkidError {
    /// Only transport failures are safe to retry.
    pub fn is_transport(&self) -> bool {
        matches!(self, ZkidError::Network(_))
    }
}

impl From<serde_json::Error> for ZkidError {
    fn from(e: serde_json::Error) -> Self {
        ZkidError::Serialization(e.to_string())
    }
}

pub type ZkidResult<T> = Result<T, ZkidError>;
