//! Big-endian byte packing into field-sized words.
//!
//! A BN254 field element holds 31 whole bytes, so byte strings are packed in
//! 31-byte chunks. The shortest chunk comes first in the input and lands in
//! the last word.

use zkid_types::{Bytes32, ZkidError, ZkidResult, FIELD_BYTES};

/// Bytes that always fit below the BN254 modulus.
pub const MAX_FIELD_BYTES: usize = 31;

/// Packs the first `max_len` bytes of `bytes` into one word.
pub fn pack_be_bytes_into_field(bytes: &[u8], max_len: usize) -> ZkidResult<Bytes32> {
    if max_len > MAX_FIELD_BYTES || bytes.len() < max_len {
        return Err(ZkidError::InvalidInput(format!(
            "Cannot pack {} bytes out of {} into a field",
            max_len,
            bytes.len()
        )));
    }
    Bytes32::from_be_slice(&bytes[..max_len])
}

/// Packs `bytes` into `ceil(len / chunk)` words. The first chunk has
/// `len % chunk` bytes (or a full chunk) and is stored at the highest index.
pub fn pack_be_bytes_into_fields(bytes: &[u8], chunk: usize) -> Vec<Bytes32> {
    if bytes.is_empty() || chunk == 0 {
        return Vec::new();
    }
    let chunk = chunk.min(MAX_FIELD_BYTES);
    let total = bytes.len().div_ceil(chunk);
    let first = match bytes.len() % chunk {
        0 => chunk,
        n => n,
    };

    let mut out = vec![Bytes32::zero(); total];
    let mut offset = 0;
    for index in (0..total).rev() {
        let size = if index == total - 1 { first } else { chunk };
        let mut word = [0u8; FIELD_BYTES];
        word[FIELD_BYTES - size..].copy_from_slice(&bytes[offset..offset + size]);
        out[index] = Bytes32(word);
        offset += size;
    }
    out
}

/// Fixed-width big-endian encoding of `value`. Higher bytes are truncated.
pub fn be_bytes(value: u64, width: usize) -> Vec<u8> {
    let full = value.to_be_bytes();
    if width >= full.len() {
        let mut out = vec![0u8; width - full.len()];
        out.extend_from_slice(&full);
        out
    } else {
        full[full.len() - width..].to_vec()
    }
}

/// Big-endian encoding without leading zero bytes. Zero encodes as `[0]`.
pub fn minimal_be_bytes(value: u64) -> Vec<u8> {
    let full = value.to_be_bytes();
    let start = full.iter().position(|b| *b != 0).unwrap_or(full.len() - 1);
    full[start..].to_vec()
}
