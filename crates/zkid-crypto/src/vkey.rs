//! Verification-key hashing for the circuit registry.

use crate::poseidon::poseidon_hash;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use zkid_types::{Bytes32, ZkidError, ZkidResult, FIELD_BYTES};

/// Public inputs the proving system adds on top of the circuit's own.
const VKEY_RESERVED_PUBLIC_INPUTS: u64 = 16;

/// Splits a serialised verification key into 32-byte words. A short final
/// chunk is left-padded.
pub fn vkey_to_fields(bytes: &[u8]) -> ZkidResult<Vec<Bytes32>> {
    bytes.chunks(FIELD_BYTES).map(Bytes32::from_be_slice).collect()
}

pub fn vkey_hash(bytes: &[u8]) -> ZkidResult<Bytes32> {
    if bytes.is_empty() {
        return Err(ZkidError::InvalidInput("Empty verification key".into()));
    }
    Ok(poseidon_hash(&vkey_to_fields(bytes)?))
}

pub fn vkey_hash_base64(encoded: &str) -> ZkidResult<Bytes32> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ZkidError::InvalidInput(format!("Verification key is not base64: {}", e)))?;
    vkey_hash(&bytes)
}

/// Circuit public-input count recorded in the second vkey word.
pub fn public_input_count(bytes: &[u8]) -> ZkidResult<u64> {
    let word = bytes
        .get(FIELD_BYTES..2 * FIELD_BYTES)
        .ok_or_else(|| ZkidError::InvalidInput("Verification key too short".into()))?;
    let count = Bytes32::from_be_slice(word)?
        .to_u64()
        .ok_or_else(|| ZkidError::InvalidInput("Public input count out of range".into()))?;
    count
        .checked_sub(VKEY_RESERVED_PUBLIC_INPUTS)
        .ok_or_else(|| ZkidError::InvalidInput(format!("Invalid public input count: {}", count)))
}
