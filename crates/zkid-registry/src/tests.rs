use super::*;
use alloy_primitives::Address;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zkid_crypto::{certificate_root, circuit_root, vkey_hash};
use zkid_types::{
    Bytes32, CertificatePublicKey, CertificateValidity, CircuitManifest, CircuitManifestEntry,
    PackagedCertificate, ZkidError, ZkidResult, CERTIFICATE_REGISTRY_ID, CIRCUIT_REGISTRY_ID,
};

const ROOT_REGISTRY: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const REGISTRY_HELPER: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

type Handler = Box<dyn Fn(&str, &[u8]) -> ZkidResult<String> + Send + Sync>;

struct MockTransport {
    handler: Handler,
    calls: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockTransport {
    fn new(handler: impl Fn(&str, &[u8]) -> ZkidResult<String> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn eth_call(&self, to: &str, data: &str) -> ZkidResult<String> {
        let bytes = hex::decode(data.trim_start_matches("0x")).unwrap();
        self.calls.lock().unwrap().push((to.to_string(), bytes.clone()));
        (self.handler)(to, &bytes)
    }
}

fn client(transport: Arc<MockTransport>) -> RegistryRpcClient {
    RegistryRpcClient::new(
        transport,
        ROOT_REGISTRY,
        REGISTRY_HELPER,
        RetryPolicy::new(3).with_base_delay(Duration::from_millis(1)),
    )
}

fn hex_words(words: &[Bytes32]) -> String {
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.0).collect();
    format!("0x{}", hex::encode(bytes))
}

fn details_words(index: u64, valid_from: u64, valid_to: u64, revoked: bool) -> Vec<Bytes32> {
    vec![
        Bytes32::from_u64(index),
        Bytes32::from_u64(0x1000 + index),
        Bytes32::from_u64(valid_from),
        Bytes32::from_u64(valid_to),
        Bytes32::from_u64(revoked as u64),
        Bytes32::from_u64(index * 10),
        Bytes32::from_u64(index),
    ]
}

fn page_payload(indices: &[u64], is_last_page: bool) -> String {
    let mut words = vec![
        Bytes32::from_u64(64),
        Bytes32::from_u64(is_last_page as u64),
        Bytes32::from_u64(indices.len() as u64),
    ];
    for index in indices {
        words.extend(details_words(*index, 1_700_000_000 + index, 0, false));
    }
    hex_words(&words)
}

fn word_at(data: &[u8], i: usize) -> Bytes32 {
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&data[4 + i * 32..4 + (i + 1) * 32]);
    Bytes32(arr)
}

/// Serves a registry of `total` roots (indices 1..=total).
fn paging_registry(total: u64) -> Arc<MockTransport> {
    MockTransport::new(move |_, data| {
        let limit = word_at(data, 2).to_u64().unwrap();
        let indices: Vec<u64> = match &data[..4] {
            [0x06, 0xac, 0x41, 0x03] => {
                let from = word_at(data, 1).to_u64().unwrap();
                (from..=total).take(limit as usize).collect()
            }
            [0x45, 0x97, 0x62, 0xdb] => {
                let after = word_at(data, 1).to_u64().unwrap() - 0x1000;
                (after + 1..=total).take(limit as usize).collect()
            }
            other => panic!("unexpected selector {:?}", other),
        };
        let is_last = indices.last().map_or(true, |last| *last == total);
        Ok(page_payload(&indices, is_last))
    })
}

// ============================================================================
// RPC calls
// ============================================================================

#[tokio::test]
async fn test_latest_root_call_encoding() {
    let transport = MockTransport::new(|_, _| Ok(hex_words(&[Bytes32::from_u64(0xabc)])));
    let rpc = client(transport.clone());

    let root = rpc.latest_root(CERTIFICATE_REGISTRY_ID).await.unwrap();
    assert_eq!(root, Bytes32::from_u64(0xabc));

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ROOT_REGISTRY);
    assert_eq!(&calls[0].1[..4], &[0xc3, 0xbc, 0x16, 0xe8]);
    assert_eq!(word_at(&calls[0].1, 0), Bytes32::from_u64(1));
}

#[tokio::test]
async fn test_is_root_valid() {
    let transport = MockTransport::new(|_, data| {
        let root = word_at(data, 1);
        Ok(hex_words(&[Bytes32::from_u64((root == Bytes32::from_u64(7)) as u64)]))
    });
    let rpc = client(transport.clone());

    assert!(rpc.is_root_valid(CIRCUIT_REGISTRY_ID, &Bytes32::from_u64(7), 1_700_000_000).await.unwrap());
    assert!(!rpc.is_root_valid(CIRCUIT_REGISTRY_ID, &Bytes32::from_u64(8), 1_700_000_000).await.unwrap());
    assert!(matches!(
        rpc.is_root_valid(CIRCUIT_REGISTRY_ID, &Bytes32::from_u64(7), -1).await,
        Err(ZkidError::InvalidInput(_))
    ));

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(&calls[0].1[..4], &[0x2a, 0xae, 0x42, 0x96]);
    assert_eq!(word_at(&calls[0].1, 0), Bytes32::from_u64(2));
    assert_eq!(word_at(&calls[0].1, 2), Bytes32::from_u64(1_700_000_000));
}

#[tokio::test]
async fn test_latest_root_details() {
    let transport = MockTransport::new(|_, _| Ok(hex_words(&details_words(4, 1_700_000_000, 0, false))));
    let rpc = client(transport.clone());

    let details = rpc.get_root_details(CERTIFICATE_REGISTRY_ID, None).await.unwrap();
    assert_eq!(details.index, 4);
    assert_eq!(details.root, Bytes32::from_u64(0x1004));
    assert_eq!(details.valid_from, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    assert_eq!(details.valid_to, None);
    assert!(!details.revoked);
    assert_eq!(details.leaves, 40);
    assert_eq!(details.cid, bytes32_to_cid(&Bytes32::from_u64(4)));
    assert!(details.is_latest);

    let calls = transport.calls();
    assert_eq!(calls[0].0, REGISTRY_HELPER);
    assert_eq!(&calls[0].1[..4], &[0x76, 0x78, 0x5a, 0xf8]);
}

#[tokio::test]
async fn test_root_details_for_superseded_root() {
    let transport = MockTransport::new(|_, _| Ok(hex_words(&details_words(2, 1_600_000_000, 1_650_000_000, true))));
    let rpc = client(transport.clone());

    let root = Bytes32::from_u64(0x1002);
    let details = rpc.get_root_details(CERTIFICATE_REGISTRY_ID, Some(&root)).await.unwrap();
    assert_eq!(details.valid_to, Some(Utc.timestamp_opt(1_650_000_000, 0).unwrap()));
    assert!(details.revoked);
    assert!(!details.is_latest);

    let calls = transport.calls();
    assert_eq!(&calls[0].1[..4], &[0x29, 0x35, 0xce, 0x4b]);
    assert_eq!(word_at(&calls[0].1, 1), root);
}

#[tokio::test]
async fn test_truncated_details_are_malformed() {
    let transport = MockTransport::new(|_, _| Ok(hex_words(&details_words(1, 1, 0, false)[..5])));
    let rpc = client(transport);
    assert!(matches!(
        rpc.get_root_details(CERTIFICATE_REGISTRY_ID, None).await,
        Err(ZkidError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_empty_result_is_malformed() {
    let transport = MockTransport::new(|_, _| Ok("0x".to_string()));
    let rpc = client(transport);
    assert!(matches!(
        rpc.latest_root(CERTIFICATE_REGISTRY_ID).await,
        Err(ZkidError::MalformedResponse(_))
    ));
}

// ============================================================================
// Historical roots
// ============================================================================

#[test]
fn test_decode_page_marks_latest_only_on_last_page() {
    let payload = hex::decode(page_payload(&[1, 2, 3], true).trim_start_matches("0x")).unwrap();
    let page = decode_historical_roots(&payload).unwrap();
    assert_eq!(page.roots.len(), 3);
    assert!(page.is_last_page);
    assert!(!page.roots[0].is_latest);
    assert!(!page.roots[1].is_latest);
    assert!(page.roots[2].is_latest);

    let payload = hex::decode(page_payload(&[1, 2], false).trim_start_matches("0x")).unwrap();
    let page = decode_historical_roots(&payload).unwrap();
    assert!(page.roots.iter().all(|r| !r.is_latest));
}

#[tokio::test]
async fn test_index_cursor_is_inclusive() {
    let rpc = client(paging_registry(5));
    let page = rpc
        .get_historical_roots(CERTIFICATE_REGISTRY_ID, RootCursor::Index(2), 2)
        .await
        .unwrap();
    let indices: Vec<u64> = page.roots.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![2, 3]);
    assert!(!page.is_last_page);
    assert_eq!(page.next_cursor(RootCursor::Index(2)), Some(RootCursor::Index(4)));
}

#[tokio::test]
async fn test_hash_cursor_is_exclusive() {
    let rpc = client(paging_registry(5));
    let from = RootCursor::Hash(Bytes32::from_u64(0x1002));
    let page = rpc
        .get_historical_roots(CERTIFICATE_REGISTRY_ID, from, 2)
        .await
        .unwrap();
    let indices: Vec<u64> = page.roots.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![3, 4]);
    assert_eq!(
        page.next_cursor(from),
        Some(RootCursor::Hash(Bytes32::from_u64(0x1004)))
    );

    let next = rpc
        .get_historical_roots(CERTIFICATE_REGISTRY_ID, page.next_cursor(from).unwrap(), 2)
        .await
        .unwrap();
    assert_eq!(next.roots.iter().map(|r| r.index).collect::<Vec<_>>(), vec![5]);
    assert!(next.is_last_page);
    assert!(next.roots[0].is_latest);
}

#[tokio::test]
async fn test_get_all_walks_every_page() {
    let rpc = client(paging_registry(5));
    let mut progress = Vec::new();
    let roots = rpc
        .get_all_historical_roots(CERTIFICATE_REGISTRY_ID, 2, |p| {
            progress.push((p.page_number, p.page_roots.len(), p.total_so_far, p.is_last_page))
        })
        .await
        .unwrap();

    assert_eq!(roots.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    assert_eq!(progress, vec![(1, 2, 2, false), (2, 2, 4, false), (3, 1, 5, true)]);
    assert_eq!(roots.iter().filter(|r| r.is_latest).count(), 1);
    assert!(roots[4].is_latest);
}

#[tokio::test]
async fn test_get_all_stops_on_empty_page() {
    let transport = MockTransport::new(|_, data| {
        let from = word_at(data, 1).to_u64().unwrap();
        if from == 1 {
            Ok(page_payload(&[1, 2], false))
        } else {
            Ok(page_payload(&[], false))
        }
    });
    let rpc = client(transport.clone());
    let roots = rpc
        .get_all_historical_roots(CIRCUIT_REGISTRY_ID, 2, |_| {})
        .await
        .unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(transport.calls().len(), 2);
    assert!(rpc.get_all_historical_roots(CIRCUIT_REGISTRY_ID, 0, |_| {}).await.is_err());
}

// ============================================================================
// Registry address, errors and retries
// ============================================================================

#[tokio::test]
async fn test_registry_address() {
    let transport = MockTransport::new(|_, data| {
        let mut word = [0u8; 32];
        if word_at(data, 0) == Bytes32::from_u64(1) {
            word[12..].copy_from_slice(&[0x42; 20]);
        }
        Ok(hex_words(&[Bytes32(word)]))
    });
    let rpc = client(transport);

    let address = rpc.get_registry_address(CERTIFICATE_REGISTRY_ID).await.unwrap();
    assert_eq!(address, Address::from_slice(&[0x42; 20]));

    match rpc.get_registry_address(9).await {
        Err(ZkidError::InvalidInput(msg)) => assert_eq!(msg, "Registry ID 9 doesn't exist"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_rpc_errors_are_not_retried() {
    let transport = MockTransport::new(|_, _| Err(ZkidError::Rpc("execution reverted".into())));
    let rpc = client(transport.clone());
    assert!(matches!(
        rpc.latest_root(CERTIFICATE_REGISTRY_ID).await,
        Err(ZkidError::Rpc(_))
    ));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_network_errors_retry_then_surface() {
    let transport = MockTransport::new(|_, _| Err(ZkidError::Network("connection refused".into())));
    let rpc = client(transport.clone());
    match rpc.latest_root(CERTIFICATE_REGISTRY_ID).await {
        Err(ZkidError::Network(msg)) => assert_eq!(msg, "connection refused"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(transport.calls().len(), 4);
}

#[tokio::test]
async fn test_network_errors_recover() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let transport = MockTransport::new(move |_, _| {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(ZkidError::Network("timeout".into()))
        } else {
            Ok(hex_words(&[Bytes32::from_u64(1)]))
        }
    });
    let rpc = client(transport);
    assert!(rpc.is_root_valid(CERTIFICATE_REGISTRY_ID, &Bytes32::from_u64(1), 0).await.unwrap());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_chain_defaults() {
    let sepolia = RegistryConfig::sepolia();
    assert_eq!(sepolia.chain_id, 11155111);
    assert_eq!(sepolia.root_registry().unwrap(), "0x9d60e8c4796199535b860fcf814ca90eda93cac1");
    assert_eq!(sepolia.registry_helper().unwrap(), "0xc46b1336b8f3cfd46a3ad3e735fef6eb4252f229");

    let local = RegistryConfig::local();
    assert_eq!(local.rpc_url().unwrap(), "http://localhost:8545");
    assert!(local.validate().is_ok());

    let mainnet = RegistryConfig::mainnet();
    assert_eq!(mainnet.chain_id, 1);
    assert_eq!(mainnet.retry_count, 3);
}

#[test]
fn test_unknown_chain_requires_explicit_values() {
    let config = RegistryConfig::for_chain(42);
    assert!(matches!(config.rpc_url(), Err(ZkidError::Config(_))));

    let config = RegistryConfig {
        rpc_url: Some("https://rpc.example".into()),
        root_registry: Some(ROOT_REGISTRY.into()),
        registry_helper: Some(REGISTRY_HELPER.into()),
        ..RegistryConfig::for_chain(42)
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation() {
    assert!(RegistryConfig::local().with_rpc_url("ws://x").validate().is_err());
    assert!(RegistryConfig::local().with_retry_count(50).validate().is_err());

    let mut bad_address = RegistryConfig::local();
    bad_address.root_registry = Some("0x1234".into());
    assert!(bad_address.validate().is_err());
}

#[test]
fn test_config_deserializes_partial() {
    let config: RegistryConfig = serde_json::from_str(r#"{"chain_id": 31337, "retry_count": 1}"#).unwrap();
    assert_eq!(config.chain_id, 31337);
    assert_eq!(config.retry_count, 1);
    assert_eq!(config.root_registry().unwrap(), "0x5FbDB2315678afecb367f032d93F642f64180aa3");
}

// ============================================================================
// Snapshots
// ============================================================================

struct MockFetcher {
    documents: BTreeMap<String, serde_json::Value>,
}

#[async_trait]
impl SnapshotFetcher for MockFetcher {
    async fn fetch_json(&self, url: &str) -> ZkidResult<serde_json::Value> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ZkidError::Network(format!("GET {} returned HTTP 404", url)))
    }
}

fn certificate(country: &str) -> PackagedCertificate {
    PackagedCertificate {
        country: country.into(),
        signature_algorithm: "RSA".into(),
        hash_algorithm: "SHA-256".into(),
        public_key: CertificatePublicKey::Rsa {
            modulus: format!("0x{}", "ab".repeat(256)),
            exponent: 65537,
            key_size: Some(2048),
        },
        validity: CertificateValidity {
            not_before: 1_000_000,
            not_after: 2_000_000,
        },
        subject_key_identifier: None,
        authority_key_identifier: None,
        tags: None,
        fingerprint: None,
    }
}

fn registry_client(documents: BTreeMap<String, serde_json::Value>) -> RegistryClient {
    let transport = MockTransport::new(|_, _| Err(ZkidError::Rpc("unused".into())));
    RegistryClient::with_parts(RegistryConfig::local(), client(transport), Arc::new(MockFetcher { documents }))
        .with_retry(RetryPolicy::none())
}

#[tokio::test]
async fn test_get_certificates_validates_root() {
    let certs = vec![certificate("FRA"), certificate("DEU")];
    let root = certificate_root(&certs, 0).unwrap();
    let config = RegistryConfig::local();
    let body = serde_json::json!({ "certificates": certs, "serialised": [] });

    let mut documents = BTreeMap::new();
    documents.insert(config.packaged_certificates_url(&root), body.clone());
    documents.insert(config.packaged_certificates_url(&Bytes32::from_u64(1)), body);
    let registry = registry_client(documents);

    let file = registry.get_certificates(Some(root), true).await.unwrap();
    assert_eq!(file.certificates.len(), 2);

    assert!(matches!(
        registry.get_certificates(Some(Bytes32::from_u64(1)), true).await,
        Err(ZkidError::ValidationFailed(_))
    ));
    assert!(registry.get_certificates(Some(Bytes32::from_u64(1)), false).await.is_ok());
}

#[test]
fn test_certificate_file_shape() {
    let missing = serde_json::json!({ "certificates": [] });
    match parse_certificates_file(missing) {
        Err(ZkidError::MalformedResponse(msg)) => {
            assert_eq!(msg, "Invalid serialised certificates tree returned")
        }
        other => panic!("unexpected result: {:?}", other),
    }
    let not_array = serde_json::json!({ "certificates": {}, "serialised": [] });
    assert!(parse_certificates_file(not_array).is_err());
}

fn manifest(hashes: &[u64]) -> CircuitManifest {
    let circuits: BTreeMap<String, CircuitManifestEntry> = hashes
        .iter()
        .enumerate()
        .map(|(i, h)| {
            (
                format!("circuit_{}", i),
                CircuitManifestEntry {
                    hash: Bytes32::from_u64(*h),
                    size: None,
                },
            )
        })
        .collect();
    CircuitManifest {
        version: "0.5.0".into(),
        root: circuit_root(hashes.iter().map(|h| Bytes32::from_u64(*h))).unwrap(),
        circuits,
    }
}

#[test]
fn test_circuit_manifest_validation() {
    let m = manifest(&[3, 1, 2]);
    assert!(validate_circuit_manifest(&m, None).is_ok());
    assert!(validate_circuit_manifest(&m, Some(&m.root)).is_ok());
    assert!(matches!(
        validate_circuit_manifest(&m, Some(&Bytes32::from_u64(9))),
        Err(ZkidError::ValidationFailed(_))
    ));

    let incomplete = serde_json::json!({ "version": "0.5.0", "circuits": {} });
    assert!(matches!(
        parse_circuit_manifest(incomplete),
        Err(ZkidError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_get_packaged_circuit() {
    let vkey: Vec<u8> = (0..128u8).collect();
    let hash = vkey_hash(&vkey).unwrap();
    let mut m = manifest(&[]);
    m.circuits.insert(
        "compare_age".into(),
        CircuitManifestEntry { hash, size: None },
    );

    let config = RegistryConfig::local();
    let circuit = serde_json::json!({
        "name": "compare_age",
        "hash": hash,
        "noir_version": "1.0.0",
        "bb_version": "0.84.0",
        "vkey": STANDARD.encode(&vkey),
        "vkey_hash": hash,
    });
    let mut documents = BTreeMap::new();
    documents.insert(config.packaged_circuit_url(&hash), circuit);
    let registry = registry_client(documents);

    let packaged = registry.get_packaged_circuit("compare_age", &m, true).await.unwrap();
    assert_eq!(packaged.vkey_hash, hash);

    assert!(matches!(
        registry.get_packaged_circuit("missing", &m, true).await,
        Err(ZkidError::InvalidInput(_))
    ));
}

#[test]
fn test_packaged_circuit_validation() {
    let vkey: Vec<u8> = (0..64u8).collect();
    let value = serde_json::json!({
        "name": "bind",
        "hash": Bytes32::from_u64(1),
        "noir_version": "1.0.0",
        "bb_version": "0.84.0",
        "vkey": STANDARD.encode(&vkey),
        "vkey_hash": Bytes32::from_u64(1),
    });
    let circuit = parse_packaged_circuit("bind", value).unwrap();
    assert!(matches!(
        validate_packaged_circuit(&circuit, None),
        Err(ZkidError::ValidationFailed(_))
    ));
    let real = vkey_hash(&vkey).unwrap();
    assert!(validate_packaged_circuit(&circuit, Some(&real)).is_ok());

    let incomplete = serde_json::json!({ "name": "bind", "hash": "0x01", "noir_version": "" });
    assert!(parse_packaged_circuit("bind", incomplete).is_err());
}
