use alloy_primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use zkid_types::{Bytes32, RootDetails, ZkidError, ZkidResult};

use crate::abi::{
    decode_result, encode_call_data, AbiEncoder, AbiReader, GET_HISTORICAL_ROOTS_BY_HASH_SELECTOR,
    GET_HISTORICAL_ROOTS_BY_INDEX_SELECTOR, GET_LATEST_ROOT_DETAILS_SELECTOR,
    GET_ROOT_DETAILS_SELECTOR, IS_ROOT_VALID_SELECTOR, LATEST_ROOT_SELECTOR, REGISTRIES_SELECTOR,
};
use crate::cid::bytes32_to_cid;
use crate::config::RegistryConfig;
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, RpcTransport};

/// Answers whether a registry root was valid at a point in time.
#[async_trait]
pub trait RootValidator: Send + Sync {
    async fn is_root_valid(&self, registry_id: u64, root: &Bytes32, timestamp: i64) -> ZkidResult<bool>;
}

/// Starting point of a historical roots page.
///
/// An index cursor includes the root at that index; a hash cursor starts
/// after the given root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootCursor {
    Index(u64),
    Hash(Bytes32),
}

impl Default for RootCursor {
    /// Index 1 is the genesis root.
    fn default() -> Self {
        RootCursor::Index(1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoricalRootsPage {
    pub roots: Vec<RootDetails>,
    pub is_last_page: bool,
}

impl HistoricalRootsPage {
    /// Cursor for the page that follows this one, if any.
    pub fn next_cursor(&self, current: RootCursor) -> Option<RootCursor> {
        if self.is_last_page || self.roots.is_empty() {
            return None;
        }
        match current {
            RootCursor::Index(index) => Some(RootCursor::Index(index + self.roots.len() as u64)),
            RootCursor::Hash(_) => self.roots.last().map(|r| RootCursor::Hash(r.root)),
        }
    }
}

#[derive(Debug)]
pub struct PageProgress<'a> {
    pub page_number: u32,
    pub page_roots: &'a [RootDetails],
    pub total_so_far: usize,
    pub is_last_page: bool,
}

pub struct RegistryRpcClient {
    transport: Arc<dyn RpcTransport>,
    root_registry: String,
    registry_helper: String,
    retry: RetryPolicy,
}

impl RegistryRpcClient {
    pub fn new(
        transport: Arc<dyn RpcTransport>,
        root_registry: impl Into<String>,
        registry_helper: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            root_registry: root_registry.into(),
            registry_helper: registry_helper.into(),
            retry,
        }
    }

    pub fn from_config(config: &RegistryConfig) -> ZkidResult<Self> {
        let transport = HttpTransport::new(config.rpc_url()?, Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(
            Arc::new(transport),
            config.root_registry()?,
            config.registry_helper()?,
            RetryPolicy::new(config.retry_count),
        ))
    }

    pub fn root_registry(&self) -> &str {
        &self.root_registry
    }

    pub fn registry_helper(&self) -> &str {
        &self.registry_helper
    }

    async fn call(&self, to: &str, label: &str, data: Vec<u8>) -> ZkidResult<Vec<u8>> {
        let data = encode_call_data(&data);
        let transport = &self.transport;
        let data = data.as_str();
        let result = self
            .retry
            .run(label, move || async move { transport.eth_call(to, data).await })
            .await?;
        let payload = decode_result(&result)?;
        if payload.is_empty() {
            return Err(ZkidError::MalformedResponse(format!(
                "{}: empty call result from {}",
                label, to
            )));
        }
        Ok(payload)
    }

    pub async fn latest_root(&self, registry_id: u64) -> ZkidResult<Bytes32> {
        debug!("Fetching latest root of registry {} from {}", registry_id, self.root_registry);
        let data = AbiEncoder::new(LATEST_ROOT_SELECTOR)?.uint(registry_id).finish();
        let payload = self.call(&self.root_registry, "latestRoot", data).await?;
        let root = AbiReader::new(&payload).read_bytes32()?;
        debug!("Latest root of registry {}: {}", registry_id, root);
        Ok(root)
    }

    pub async fn is_root_valid(&self, registry_id: u64, root: &Bytes32, timestamp: i64) -> ZkidResult<bool> {
        let timestamp = u64::try_from(timestamp)
            .map_err(|_| ZkidError::InvalidInput(format!("Negative timestamp: {}", timestamp)))?;
        let data = AbiEncoder::new(IS_ROOT_VALID_SELECTOR)?
            .uint(registry_id)
            .word(root)
            .uint(timestamp)
            .finish();
        let payload = self.call(&self.root_registry, "isRootValid", data).await?;
        let valid = AbiReader::new(&payload).read_bool()?;
        debug!("Root {} of registry {} valid at {}: {}", root, registry_id, timestamp, valid);
        Ok(valid)
    }

    /// Details of `root`, or of the latest root when `root` is `None`.
    pub async fn get_root_details(&self, registry_id: u64, root: Option<&Bytes32>) -> ZkidResult<RootDetails> {
        let (data, label) = match root {
            Some(root) => (
                AbiEncoder::new(GET_ROOT_DETAILS_SELECTOR)?
                    .uint(registry_id)
                    .word(root)
                    .finish(),
                "getRootDetails",
            ),
            None => (
                AbiEncoder::new(GET_LATEST_ROOT_DETAILS_SELECTOR)?
                    .uint(registry_id)
                    .finish(),
                "getLatestRootDetails",
            ),
        };
        let payload = self.call(&self.registry_helper, label, data).await?;
        let mut details = read_root_details(&mut AbiReader::new(&payload))?;
        details.is_latest = root.is_none() || details.valid_to.is_none();
        Ok(details)
    }

    pub async fn get_historical_roots(
        &self,
        registry_id: u64,
        from: RootCursor,
        limit: u64,
    ) -> ZkidResult<HistoricalRootsPage> {
        let (encoder, label) = match from {
            RootCursor::Index(index) => (
                AbiEncoder::new(GET_HISTORICAL_ROOTS_BY_INDEX_SELECTOR)?
                    .uint(registry_id)
                    .uint(index),
                "getHistoricalRoots(index)",
            ),
            RootCursor::Hash(hash) => (
                AbiEncoder::new(GET_HISTORICAL_ROOTS_BY_HASH_SELECTOR)?
                    .uint(registry_id)
                    .word(&hash),
                "getHistoricalRoots(hash)",
            ),
        };
        let data = encoder.uint(limit).finish();
        let payload = self.call(&self.registry_helper, label, data).await?;
        decode_historical_roots(&payload)
    }

    /// Walks every page from the genesis root, reporting each page to `on_progress`.
    pub async fn get_all_historical_roots<F>(
        &self,
        registry_id: u64,
        page_size: u64,
        mut on_progress: F,
    ) -> ZkidResult<Vec<RootDetails>>
    where
        F: FnMut(&PageProgress<'_>),
    {
        if page_size == 0 {
            return Err(ZkidError::InvalidInput("page_size must be greater than zero".into()));
        }

        let mut cursor = RootCursor::default();
        let mut all_roots = Vec::new();
        let mut page_number = 0u32;

        loop {
            let page = self.get_historical_roots(registry_id, cursor, page_size).await?;
            page_number += 1;
            all_roots.extend(page.roots.iter().cloned());

            on_progress(&PageProgress {
                page_number,
                page_roots: &page.roots,
                total_so_far: all_roots.len(),
                is_last_page: page.is_last_page,
            });

            match page.next_cursor(cursor) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        info!(
            "Fetched {} historical roots of registry {} in {} pages",
            all_roots.len(),
            registry_id,
            page_number
        );
        Ok(all_roots)
    }

    pub async fn get_registry_address(&self, registry_id: u64) -> ZkidResult<Address> {
        debug!("Fetching address of registry {} from {}", registry_id, self.root_registry);
        let data = AbiEncoder::new(REGISTRIES_SELECTOR)?.uint(registry_id).finish();
        let payload = self.call(&self.root_registry, "registries", data).await?;
        let address = AbiReader::new(&payload).read_address()?;
        if address == Address::ZERO {
            return Err(ZkidError::InvalidInput(format!(
                "Registry ID {} doesn't exist",
                registry_id
            )));
        }
        Ok(address)
    }
}

#[async_trait]
impl RootValidator for RegistryRpcClient {
    async fn is_root_valid(&self, registry_id: u64, root: &Bytes32, timestamp: i64) -> ZkidResult<bool> {
        RegistryRpcClient::is_root_valid(self, registry_id, root, timestamp).await
    }
}

fn timestamp(secs: u64) -> ZkidResult<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .ok_or_else(|| ZkidError::MalformedResponse(format!("Timestamp out of range: {}", secs)))
}

/// Reads the 7-word `RootDetails` struct. `is_latest` is left for the caller.
pub fn read_root_details(reader: &mut AbiReader<'_>) -> ZkidResult<RootDetails> {
    let index = reader.read_u64()?;
    let root = reader.read_bytes32()?;
    let valid_from = timestamp(reader.read_u64()?)?;
    let valid_to = match reader.read_u64()? {
        0 => None,
        secs => Some(timestamp(secs)?),
    };
    let revoked = reader.read_bool()?;
    let leaves = reader.read_u64()?;
    let cid = bytes32_to_cid(&reader.read_bytes32()?);
    Ok(RootDetails {
        index,
        root,
        valid_from,
        valid_to,
        revoked,
        leaves,
        cid,
        is_latest: false,
    })
}

/// Decodes `(RootDetails[], bool isLastPage)`.
pub fn decode_historical_roots(payload: &[u8]) -> ZkidResult<HistoricalRootsPage> {
    let mut reader = AbiReader::new(payload);
    let mut roots = reader.read_dynamic_array(read_root_details)?;
    let is_last_page = reader.read_bool()?;
    if is_last_page {
        if let Some(last) = roots.last_mut() {
            last.is_latest = true;
        }
    }
    Ok(HistoricalRootsPage {
        roots,
        is_last_page,
    })
}
