//! CIDv0 encoding of the `bytes32` snapshot digest stored on chain.

use zkid_types::{Bytes32, ZkidError, ZkidResult, FIELD_BYTES};

/// Multihash prefix: sha2-256, 32-byte digest.
const MULTIHASH_PREFIX: [u8; 2] = [0x12, 0x20];

pub fn bytes32_to_cid(digest: &Bytes32) -> String {
    let mut bytes = Vec::with_capacity(2 + FIELD_BYTES);
    bytes.extend_from_slice(&MULTIHASH_PREFIX);
    bytes.extend_from_slice(digest.as_bytes());
    bs58::encode(bytes).into_string()
}

pub fn cid_to_bytes32(cid: &str) -> ZkidResult<Bytes32> {
    let bytes = bs58::decode(cid)
        .into_vec()
        .map_err(|e| ZkidError::InvalidInput(format!("Invalid CID {}: {}", cid, e)))?;
    if bytes.len() != 2 + FIELD_BYTES || bytes[..2] != MULTIHASH_PREFIX {
        return Err(ZkidError::InvalidInput(format!("Not a CIDv0: {}", cid)));
    }
    Bytes32::from_be_slice(&bytes[2..])
}
