use alloy_primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use zkid_crypto::{certificate_root, circuit_manifest_root, vkey_hash_base64};
use zkid_types::{
    Bytes32, CircuitManifest, PackagedCertificate, PackagedCertificatesFile, PackagedCircuit,
    RootDetails, ZkidError, ZkidResult, CERTIFICATE_REGISTRY_ID, CIRCUIT_REGISTRY_ID,
};

use crate::config::RegistryConfig;
use crate::fetch::{HttpFetcher, SnapshotFetcher};
use crate::retry::RetryPolicy;
use crate::rpc::{HistoricalRootsPage, PageProgress, RegistryRpcClient, RootCursor, RootValidator};

/// Registry facade: on-chain roots plus the packaged snapshots they commit to.
pub struct RegistryClient {
    config: RegistryConfig,
    rpc: RegistryRpcClient,
    fetcher: Arc<dyn SnapshotFetcher>,
    retry: RetryPolicy,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> ZkidResult<Self> {
        let rpc = RegistryRpcClient::from_config(&config)?;
        let fetcher = HttpFetcher::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_parts(config, rpc, Arc::new(fetcher)))
    }

    pub fn with_parts(config: RegistryConfig, rpc: RegistryRpcClient, fetcher: Arc<dyn SnapshotFetcher>) -> Self {
        let retry = RetryPolicy::new(config.retry_count);
        Self {
            config,
            rpc,
            fetcher,
            retry,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn rpc(&self) -> &RegistryRpcClient {
        &self.rpc
    }

    async fn fetch(&self, url: &str) -> ZkidResult<serde_json::Value> {
        let fetcher = &self.fetcher;
        self.retry
            .run("snapshot fetch", move || async move { fetcher.fetch_json(url).await })
            .await
    }

    pub async fn certificates_root(&self) -> ZkidResult<Bytes32> {
        self.rpc.latest_root(CERTIFICATE_REGISTRY_ID).await
    }

    pub async fn circuits_root(&self) -> ZkidResult<Bytes32> {
        self.rpc.latest_root(CIRCUIT_REGISTRY_ID).await
    }

    /// Packaged certificates for `root` (latest when `None`).
    pub async fn get_certificates(&self, root: Option<Bytes32>, validate: bool) -> ZkidResult<PackagedCertificatesFile> {
        let root = match root {
            Some(root) => root,
            None => self.certificates_root().await?,
        };

        let url = self.config.packaged_certificates_url(&root);
        info!("Fetching packaged certificates from {}", url);
        let value = self.fetch(&url).await?;
        let file = parse_certificates_file(value)?;
        debug!("Got {} packaged certificates", file.certificates.len());

        if validate {
            validate_certificates(&file.certificates, file.version, &root)?;
        }
        Ok(file)
    }

    /// Circuit manifest for `root` (latest when `None`).
    pub async fn get_circuit_manifest(&self, root: Option<Bytes32>, validate: bool) -> ZkidResult<CircuitManifest> {
        let root = match root {
            Some(root) => root,
            None => self.circuits_root().await?,
        };

        let url = self.config.circuit_manifest_url(&root);
        info!("Fetching circuit manifest from {}", url);
        let manifest = parse_circuit_manifest(self.fetch(&url).await?)?;

        if validate {
            validate_circuit_manifest(&manifest, Some(&root))?;
        }
        Ok(manifest)
    }

    pub async fn get_packaged_circuit(
        &self,
        name: &str,
        manifest: &CircuitManifest,
        validate: bool,
    ) -> ZkidResult<PackagedCircuit> {
        let hash = manifest
            .circuits
            .get(name)
            .map(|entry| entry.hash)
            .ok_or_else(|| ZkidError::InvalidInput(format!("Circuit {} not found in manifest", name)))?;

        let url = self.config.packaged_circuit_url(&hash);
        info!("Fetching packaged circuit {} from {}", name, url);
        let circuit = parse_packaged_circuit(name, self.fetch(&url).await?)?;

        if validate {
            validate_packaged_circuit(&circuit, Some(&hash))?;
        }
        Ok(circuit)
    }

    pub async fn is_certificate_root_valid(&self, root: &Bytes32, timestamp: i64) -> ZkidResult<bool> {
        self.rpc.is_root_valid(CERTIFICATE_REGISTRY_ID, root, timestamp).await
    }

    pub async fn is_circuit_root_valid(&self, root: &Bytes32, timestamp: i64) -> ZkidResult<bool> {
        self.rpc.is_root_valid(CIRCUIT_REGISTRY_ID, root, timestamp).await
    }

    pub async fn latest_certificates_root_details(&self) -> ZkidResult<RootDetails> {
        self.rpc.get_root_details(CERTIFICATE_REGISTRY_ID, None).await
    }

    pub async fn latest_circuits_root_details(&self) -> ZkidResult<RootDetails> {
        self.rpc.get_root_details(CIRCUIT_REGISTRY_ID, None).await
    }

    pub async fn historical_certificate_roots(&self, from: RootCursor, limit: u64) -> ZkidResult<HistoricalRootsPage> {
        self.rpc.get_historical_roots(CERTIFICATE_REGISTRY_ID, from, limit).await
    }

    pub async fn historical_circuit_roots(&self, from: RootCursor, limit: u64) -> ZkidResult<HistoricalRootsPage> {
        self.rpc.get_historical_roots(CIRCUIT_REGISTRY_ID, from, limit).await
    }

    pub async fn all_historical_certificate_roots<F>(&self, page_size: u64, on_progress: F) -> ZkidResult<Vec<RootDetails>>
    where
        F: FnMut(&PageProgress<'_>),
    {
        self.rpc
            .get_all_historical_roots(CERTIFICATE_REGISTRY_ID, page_size, on_progress)
            .await
    }

    pub async fn all_historical_circuit_roots<F>(&self, page_size: u64, on_progress: F) -> ZkidResult<Vec<RootDetails>>
    where
        F: FnMut(&PageProgress<'_>),
    {
        self.rpc
            .get_all_historical_roots(CIRCUIT_REGISTRY_ID, page_size, on_progress)
            .await
    }

    pub async fn certificate_registry_address(&self) -> ZkidResult<Address> {
        self.rpc.get_registry_address(CERTIFICATE_REGISTRY_ID).await
    }

    pub async fn circuit_registry_address(&self) -> ZkidResult<Address> {
        self.rpc.get_registry_address(CIRCUIT_REGISTRY_ID).await
    }
}

#[async_trait]
impl RootValidator for RegistryClient {
    async fn is_root_valid(&self, registry_id: u64, root: &Bytes32, timestamp: i64) -> ZkidResult<bool> {
        self.rpc.is_root_valid(registry_id, root, timestamp).await
    }
}

fn require_array(value: &serde_json::Value, key: &str, message: &str) -> ZkidResult<()> {
    match value.get(key) {
        Some(serde_json::Value::Array(_)) => Ok(()),
        _ => Err(ZkidError::MalformedResponse(message.to_string())),
    }
}

fn require_present(value: &serde_json::Value, key: &str) -> bool {
    match value.get(key) {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

pub fn parse_certificates_file(value: serde_json::Value) -> ZkidResult<PackagedCertificatesFile> {
    require_array(&value, "certificates", "Invalid certificates returned")?;
    require_array(&value, "serialised", "Invalid serialised certificates tree returned")?;
    serde_json::from_value(value)
        .map_err(|e| ZkidError::MalformedResponse(format!("Invalid packaged certificates: {}", e)))
}

pub fn parse_circuit_manifest(value: serde_json::Value) -> ZkidResult<CircuitManifest> {
    if !["version", "root", "circuits"].iter().all(|k| require_present(&value, k)) {
        return Err(ZkidError::MalformedResponse("Invalid circuit manifest returned".into()));
    }
    serde_json::from_value(value)
        .map_err(|e| ZkidError::MalformedResponse(format!("Invalid circuit manifest: {}", e)))
}

pub fn parse_packaged_circuit(name: &str, value: serde_json::Value) -> ZkidResult<PackagedCircuit> {
    if !["name", "hash", "noir_version", "bb_version"]
        .iter()
        .all(|k| require_present(&value, k))
    {
        return Err(ZkidError::MalformedResponse(format!(
            "Invalid packaged circuit returned for {}",
            name
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| ZkidError::MalformedResponse(format!("Invalid packaged circuit {}: {}", name, e)))
}

pub fn validate_certificates(certificates: &[PackagedCertificate], version: u8, root: &Bytes32) -> ZkidResult<()> {
    let calculated = certificate_root(certificates, version)?;
    if calculated != *root {
        warn!("Packaged certificates root mismatch: expected {}, got {}", root, calculated);
        return Err(ZkidError::ValidationFailed(format!(
            "Validation failed for packaged certificates: {}",
            root
        )));
    }
    info!("Validated {} packaged certificates against root {}", certificates.len(), root);
    Ok(())
}

/// Checks against `root`, or the manifest's own root when `None`.
pub fn validate_circuit_manifest(manifest: &CircuitManifest, root: Option<&Bytes32>) -> ZkidResult<()> {
    let expected = root.unwrap_or(&manifest.root);
    let calculated = circuit_manifest_root(manifest)?;
    if calculated != *expected {
        warn!("Circuit manifest root mismatch: expected {}, got {}", expected, calculated);
        return Err(ZkidError::ValidationFailed(format!(
            "Validation failed for circuit manifest: {}",
            expected
        )));
    }
    info!("Validated circuit manifest {} against root {}", manifest.version, expected);
    Ok(())
}

/// Checks the vkey hash against `hash`, or the circuit's own `vkey_hash` when `None`.
pub fn validate_packaged_circuit(circuit: &PackagedCircuit, hash: Option<&Bytes32>) -> ZkidResult<()> {
    let expected = hash.unwrap_or(&circuit.vkey_hash);
    let calculated = vkey_hash_base64(&circuit.vkey)?;
    if calculated != *expected {
        warn!("Packaged circuit {} hash mismatch: expected {}, got {}", circuit.name, expected, calculated);
        return Err(ZkidError::ValidationFailed(format!(
            "Validation failed for packaged circuit: {}",
            circuit.name
        )));
    }
    debug!("Validated packaged circuit {} against hash {}", circuit.name, expected);
    Ok(())
}
