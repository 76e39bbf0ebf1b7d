use crate::{ZkidError, ZkidResult, FIELD_BYTES};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 32-byte big-endian word: field elements, hashes and ABI words alike.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bytes32(pub [u8; FIELD_BYTES]);

impl Bytes32 {
    pub fn from_bytes(bytes: [u8; FIELD_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FIELD_BYTES] {
        &self.0
    }

    pub fn zero() -> Self {
        Self([0u8; FIELD_BYTES])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut arr = [0u8; FIELD_BYTES];
        arr[24..].copy_from_slice(&value.to_be_bytes());
        Self(arr)
    }

    /// Returns `None` when the value does not fit in 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(buf))
    }

    /// Left-pads a big-endian slice of at most 32 bytes.
    pub fn from_be_slice(bytes: &[u8]) -> ZkidResult<Self> {
        if bytes.len() > FIELD_BYTES {
            return Err(ZkidError::InvalidInput(format!(
                "Value is {} bytes, expected at most {}",
                bytes.len(),
                FIELD_BYTES
            )));
        }
        let mut arr = [0u8; FIELD_BYTES];
        arr[FIELD_BYTES - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Lowercase, `0x`-prefixed, 64 hex digits.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Accepts an optional `0x` prefix and left-pads short values, so that
    /// `0x1` and `0x00..01` decode to the same word.
    pub fn from_hex(s: &str) -> ZkidResult<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() > FIELD_BYTES * 2 {
            return Err(ZkidError::InvalidInput(format!(
                "Hex value too long: {} digits",
                digits.len()
            )));
        }
        let padded = format!("{:0>64}", digits);
        let bytes = hex::decode(padded).map_err(|e| ZkidError::InvalidInput(e.to_string()))?;
        let mut arr = [0u8; FIELD_BYTES];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({})", self.to_hex())
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Bytes32 {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<[u8; FIELD_BYTES]> for Bytes32 {
    fn from(bytes: [u8; FIELD_BYTES]) -> Self {
        Self(bytes)
    }
}

impl From<u64> for Bytes32 {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl std::str::FromStr for Bytes32 {
    type Err = ZkidError;

    fn from_str(s: &str) -> ZkidResult<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct Bytes32Visitor;

impl<'de> Visitor<'de> for Bytes32Visitor {
    type Value = Bytes32;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a hex string or an unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Bytes32, E> {
        Bytes32::from_hex(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Bytes32, E> {
        Ok(Bytes32::from_u64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Bytes32, E> {
        u64::try_from(v)
            .map(Bytes32::from_u64)
            .map_err(|_| E::custom("negative value"))
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(Bytes32Visitor)
    }
}
