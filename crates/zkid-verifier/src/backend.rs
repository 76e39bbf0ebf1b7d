use async_trait::async_trait;
use zkid_types::{Bytes32, ProofResult, ZkidResult};

/// Cryptographic verification of a single proof against its verification
/// key. The chain validator only calls it once every semantic check passed.
#[async_trait]
pub trait ProofBackend: Send + Sync {
    async fn verify(&self, proof: &ProofResult, vkey_hash: &Bytes32, public_inputs: &[Bytes32]) -> ZkidResult<bool>;
}
