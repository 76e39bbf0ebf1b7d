//! Minimal ABI support for the registry contracts: static calls in,
//! fixed words and one level of dynamic arrays out.

use alloy_primitives::{Address, U256};
use zkid_types::{Bytes32, ZkidError, ZkidResult, FIELD_BYTES};

pub const LATEST_ROOT_SELECTOR: &str = "c3bc16e8";
pub const IS_ROOT_VALID_SELECTOR: &str = "2aae4296";
pub const GET_LATEST_ROOT_DETAILS_SELECTOR: &str = "76785af8";
pub const GET_ROOT_DETAILS_SELECTOR: &str = "2935ce4b";
pub const GET_HISTORICAL_ROOTS_BY_INDEX_SELECTOR: &str = "06ac4103";
pub const GET_HISTORICAL_ROOTS_BY_HASH_SELECTOR: &str = "459762db";
pub const REGISTRIES_SELECTOR: &str = "5d8d57a6";

const WORD: usize = FIELD_BYTES;

pub struct AbiEncoder {
    data: Vec<u8>,
}

impl AbiEncoder {
    pub fn new(selector: &str) -> ZkidResult<Self> {
        let selector = hex::decode(selector.trim_start_matches("0x"))
            .map_err(|e| ZkidError::Internal(format!("Invalid selector {}: {}", selector, e)))?;
        if selector.len() != 4 {
            return Err(ZkidError::Internal(format!(
                "Selector must be 4 bytes, got {}",
                selector.len()
            )));
        }
        Ok(Self { data: selector })
    }

    pub fn word(mut self, word: &Bytes32) -> Self {
        self.data.extend_from_slice(word.as_bytes());
        self
    }

    pub fn uint(self, value: u64) -> Self {
        self.word(&Bytes32::from_u64(value))
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

/// Cursor over an ABI-encoded return payload.
pub struct AbiReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AbiReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn next_word(&mut self) -> ZkidResult<&'a [u8]> {
        let end = self.offset + WORD;
        if end > self.data.len() {
            return Err(ZkidError::MalformedResponse(format!(
                "ABI payload truncated: need {} bytes, have {}",
                end,
                self.data.len()
            )));
        }
        let word = &self.data[self.offset..end];
        self.offset = end;
        Ok(word)
    }

    pub fn read_u256(&mut self) -> ZkidResult<U256> {
        Ok(U256::from_be_slice(self.next_word()?))
    }

    pub fn read_u64(&mut self) -> ZkidResult<u64> {
        let value = self.read_u256()?;
        if value.bit_len() > 64 {
            return Err(ZkidError::MalformedResponse(format!(
                "Integer does not fit in 64 bits: {}",
                value
            )));
        }
        Ok(value.as_limbs()[0])
    }

    pub fn read_bytes32(&mut self) -> ZkidResult<Bytes32> {
        let mut arr = [0u8; WORD];
        arr.copy_from_slice(self.next_word()?);
        Ok(Bytes32(arr))
    }

    pub fn read_bool(&mut self) -> ZkidResult<bool> {
        match self.read_u64()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ZkidError::MalformedResponse(format!(
                "Invalid ABI bool: {}",
                other
            ))),
        }
    }

    /// Takes the low 20 bytes of the word.
    pub fn read_address(&mut self) -> ZkidResult<Address> {
        let word = self.next_word()?;
        Ok(Address::from_slice(&word[WORD - 20..]))
    }

    /// Follows the head offset (bytes from the start of the payload) and
    /// decodes `length` elements with `read`. Advances this cursor by one word.
    pub fn read_dynamic_array<T, F>(&mut self, mut read: F) -> ZkidResult<Vec<T>>
    where
        F: FnMut(&mut AbiReader<'a>) -> ZkidResult<T>,
    {
        let offset = self.read_u64()? as usize;
        if offset > self.data.len() {
            return Err(ZkidError::MalformedResponse(format!(
                "Array offset {} beyond payload of {} bytes",
                offset,
                self.data.len()
            )));
        }
        let mut tail = AbiReader {
            data: self.data,
            offset,
        };
        let length = tail.read_u64()? as usize;
        if length > tail.remaining() / WORD {
            return Err(ZkidError::MalformedResponse(format!(
                "Array length {} exceeds payload",
                length
            )));
        }
        let mut items = Vec::with_capacity(length);
        for _ in 0..length {
            items.push(read(&mut tail)?);
        }
        Ok(items)
    }
}

/// Decodes an `eth_call` result string into raw bytes.
pub fn decode_result(result: &str) -> ZkidResult<Vec<u8>> {
    let digits = result.strip_prefix("0x").unwrap_or(result);
    hex::decode(digits)
        .map_err(|e| ZkidError::MalformedResponse(format!("Invalid hex in call result: {}", e)))
}

pub fn encode_call_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}
