use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use zkid_types::{Bytes32, ZkidError, ZkidResult, DEFAULT_RETRY_COUNT};

use crate::transport::DEFAULT_TIMEOUT_SECS;

pub const ETHEREUM_CHAIN_ID: u64 = 1;
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
pub const LOCAL_CHAIN_ID: u64 = 31337;

pub const MAINNET_RPC_URL: &str = "https://ethereum-rpc.publicnode.com";
pub const SEPOLIA_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";
pub const LOCAL_RPC_URL: &str = "http://localhost:8545";

pub const ROOT_REGISTRY_MAINNET: &str = "0x0000000000000000000000000000000000000000";
pub const REGISTRY_HELPER_MAINNET: &str = "0x0000000000000000000000000000000000000000";

pub const ROOT_REGISTRY_SEPOLIA: &str = "0x9d60e8c4796199535b860fcf814ca90eda93cac1";
pub const REGISTRY_HELPER_SEPOLIA: &str = "0xc46b1336b8f3cfd46a3ad3e735fef6eb4252f229";

pub const ROOT_REGISTRY_LOCAL: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const REGISTRY_HELPER_LOCAL: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

pub const DEFAULT_CERTIFICATES_URL: &str = "https://certificates.zkpassport.id";
pub const DEFAULT_CIRCUITS_URL: &str = "https://circuits.zkpassport.id";

/// Retry counts above this are almost certainly a misconfiguration.
pub const MAX_RETRY_COUNT: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainDefaults {
    pub chain_id: u64,
    pub rpc_url: &'static str,
    pub root_registry: &'static str,
    pub registry_helper: &'static str,
}

pub const CHAIN_DEFAULTS: &[ChainDefaults] = &[
    ChainDefaults {
        chain_id: ETHEREUM_CHAIN_ID,
        rpc_url: MAINNET_RPC_URL,
        root_registry: ROOT_REGISTRY_MAINNET,
        registry_helper: REGISTRY_HELPER_MAINNET,
    },
    ChainDefaults {
        chain_id: SEPOLIA_CHAIN_ID,
        rpc_url: SEPOLIA_RPC_URL,
        root_registry: ROOT_REGISTRY_SEPOLIA,
        registry_helper: REGISTRY_HELPER_SEPOLIA,
    },
    ChainDefaults {
        chain_id: LOCAL_CHAIN_ID,
        rpc_url: LOCAL_RPC_URL,
        root_registry: ROOT_REGISTRY_LOCAL,
        registry_helper: REGISTRY_HELPER_LOCAL,
    },
];

pub fn chain_defaults(chain_id: u64) -> Option<&'static ChainDefaults> {
    CHAIN_DEFAULTS.iter().find(|d| d.chain_id == chain_id)
}

/// Where the registry lives and how to reach it. Unset fields fall back to
/// the defaults of `chain_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub chain_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_registry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_helper: Option<String>,
    pub retry_count: u32,
    pub timeout_secs: u64,
    pub certificates_url: String,
    pub circuits_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::sepolia()
    }
}

impl RegistryConfig {
    pub fn for_chain(chain_id: u64) -> Self {
        let defaults = chain_defaults(chain_id);
        Self {
            chain_id,
            rpc_url: defaults.map(|d| d.rpc_url.to_string()),
            root_registry: defaults.map(|d| d.root_registry.to_string()),
            registry_helper: defaults.map(|d| d.registry_helper.to_string()),
            retry_count: DEFAULT_RETRY_COUNT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            certificates_url: DEFAULT_CERTIFICATES_URL.to_string(),
            circuits_url: DEFAULT_CIRCUITS_URL.to_string(),
        }
    }

    pub fn mainnet() -> Self {
        Self::for_chain(ETHEREUM_CHAIN_ID)
    }

    pub fn sepolia() -> Self {
        Self::for_chain(SEPOLIA_CHAIN_ID)
    }

    pub fn local() -> Self {
        Self::for_chain(LOCAL_CHAIN_ID)
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    fn resolve<'a>(
        &'a self,
        value: &'a Option<String>,
        fallback: impl FnOnce(&ChainDefaults) -> &'static str,
        what: &str,
    ) -> ZkidResult<&'a str> {
        match value {
            Some(v) if !v.is_empty() => Ok(v.as_str()),
            _ => chain_defaults(self.chain_id).map(fallback).ok_or_else(|| {
                ZkidError::Config(format!("No {} configured for chain {}", what, self.chain_id))
            }),
        }
    }

    pub fn rpc_url(&self) -> ZkidResult<&str> {
        self.resolve(&self.rpc_url, |d| d.rpc_url, "RPC URL")
    }

    pub fn root_registry(&self) -> ZkidResult<&str> {
        self.resolve(&self.root_registry, |d| d.root_registry, "root registry address")
    }

    pub fn registry_helper(&self) -> ZkidResult<&str> {
        self.resolve(&self.registry_helper, |d| d.registry_helper, "registry helper address")
    }

    pub fn packaged_certificates_url(&self, root: &Bytes32) -> String {
        format!(
            "{}/{}/{}.json",
            self.certificates_url.trim_end_matches('/'),
            self.chain_id,
            root.to_hex()
        )
    }

    pub fn circuit_manifest_url(&self, root: &Bytes32) -> String {
        format!(
            "{}/manifests/{}/{}.json",
            self.circuits_url.trim_end_matches('/'),
            self.chain_id,
            root.to_hex()
        )
    }

    pub fn packaged_circuit_url(&self, hash: &Bytes32) -> String {
        format!(
            "{}/packaged/{}/{}.json",
            self.circuits_url.trim_end_matches('/'),
            self.chain_id,
            hash.to_hex()
        )
    }

    pub fn validate(&self) -> ZkidResult<()> {
        let rpc_url = self.rpc_url()?;
        if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
            return Err(ZkidError::Config(format!("RPC URL must be http(s): {}", rpc_url)));
        }

        for (label, value) in [
            ("root_registry", self.root_registry()?),
            ("registry_helper", self.registry_helper()?),
        ] {
            value
                .parse::<Address>()
                .map_err(|e| ZkidError::Config(format!("Invalid {} address {}: {}", label, value, e)))?;
        }

        if self.retry_count > MAX_RETRY_COUNT {
            return Err(ZkidError::Config(format!(
                "retry_count must be at most {}",
                MAX_RETRY_COUNT
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ZkidError::Config("timeout_secs must be greater than zero".into()));
        }

        Ok(())
    }
}
