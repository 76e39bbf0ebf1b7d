use crate::Bytes32;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One snapshot record of an on-chain registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootDetails {
    pub index: u64,
    pub root: Bytes32,
    pub valid_from: DateTime<Utc>,
    /// Set once the root has been superseded.
    pub valid_to: Option<DateTime<Utc>>,
    pub revoked: bool,
    pub leaves: u64,
    /// CIDv0 of the packaged snapshot.
    pub cid: String,
    pub is_latest: bool,
}

impl RootDetails {
    /// A root is usable at `at` when it is not revoked and its validity window contains `at`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        if self.revoked || at < self.valid_from {
            return false;
        }
        match self.valid_to {
            Some(valid_to) => at < valid_to,
            None => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CertificatePublicKey {
    #[serde(rename = "RSA")]
    Rsa {
        modulus: String,
        exponent: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_size: Option<u32>,
    },
    #[serde(rename = "EC")]
    Ec {
        curve: String,
        public_key_x: String,
        public_key_y: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_size: Option<u32>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateValidity {
    pub not_before: i64,
    pub not_after: i64,
}

/// A trusted CSCA certificate as shipped in a packaged snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagedCertificate {
    pub country: String,
    pub signature_algorithm: String,
    pub hash_algorithm: String,
    pub public_key: CertificatePublicKey,
    pub validity: CertificateValidity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_key_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_key_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Bytes32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackagedCertificatesFile {
    #[serde(default)]
    pub version: u8,
    pub certificates: Vec<PackagedCertificate>,
    pub serialised: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitManifestEntry {
    pub hash: Bytes32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitManifest {
    pub version: String,
    pub root: Bytes32,
    pub circuits: BTreeMap<String, CircuitManifestEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagedCircuit {
    pub name: String,
    pub hash: Bytes32,
    pub noir_version: String,
    pub bb_version: String,
    /// Base64 verification key.
    pub vkey: String,
    pub vkey_hash: Bytes32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}
