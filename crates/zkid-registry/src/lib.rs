#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod abi;
mod cid;
mod client;
mod config;
mod fetch;
mod retry;
mod rpc;
mod transport;

pub use cid::{bytes32_to_cid, cid_to_bytes32};
pub use client::{
    parse_certificates_file, parse_circuit_manifest, parse_packaged_circuit, validate_certificates,
    validate_circuit_manifest, validate_packaged_circuit, RegistryClient,
};
pub use config::{
    chain_defaults, ChainDefaults, RegistryConfig, CHAIN_DEFAULTS, ETHEREUM_CHAIN_ID,
    LOCAL_CHAIN_ID, SEPOLIA_CHAIN_ID,
};
pub use fetch::{HttpFetcher, SnapshotFetcher};
pub use retry::{Backoff, RetryPolicy, DEFAULT_BASE_DELAY};
pub use rpc::{
    decode_historical_roots, read_root_details, HistoricalRootsPage, PageProgress,
    RegistryRpcClient, RootCursor, RootValidator,
};
pub use transport::{HttpTransport, RpcTransport, DEFAULT_TIMEOUT_SECS};

#[cfg(test)]
mod tests;
