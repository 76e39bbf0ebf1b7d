use crate::{Bytes32, CircuitStage, CommittedInputs, ZkidError, ZkidResult, FIELD_BYTES};
use serde::{Deserialize, Serialize};

/// A proof produced on the holder's device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofResult {
    pub name: String,
    /// Hex-encoded proof; public inputs come first as 32-byte words.
    pub proof: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vkey_hash: Option<Bytes32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_inputs: Option<CommittedInputs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

impl ProofResult {
    pub fn stage(&self) -> CircuitStage {
        CircuitStage::parse(&self.name)
    }

    /// Splits the proof into 32-byte big-endian words.
    pub fn fields(&self) -> ZkidResult<Vec<Bytes32>> {
        let digits = self.proof.strip_prefix("0x").unwrap_or(&self.proof);
        let bytes = hex::decode(digits)
            .map_err(|e| ZkidError::InvalidInput(format!("Proof {} is not hex: {}", self.name, e)))?;
        if bytes.len() % FIELD_BYTES != 0 {
            return Err(ZkidError::InvalidInput(format!(
                "Proof {} length {} is not a multiple of {}",
                self.name,
                bytes.len(),
                FIELD_BYTES
            )));
        }
        Ok(bytes
            .chunks(FIELD_BYTES)
            .map(|chunk| {
                let mut arr = [0u8; FIELD_BYTES];
                arr.copy_from_slice(chunk);
                Bytes32(arr)
            })
            .collect())
    }

    /// The first `count` words of the proof.
    pub fn public_inputs(&self, count: usize) -> ZkidResult<Vec<Bytes32>> {
        let mut fields = self.fields()?;
        if fields.len() < count {
            return Err(ZkidError::InvalidInput(format!(
                "Proof {} has {} fields, expected at least {} public inputs",
                self.name,
                fields.len(),
                count
            )));
        }
        fields.truncate(count);
        Ok(fields)
    }

    pub fn committed_inputs(&self) -> CommittedInputs {
        self.committed_inputs.clone().unwrap_or_default()
    }
}

/// Concatenates words into a proof hex string. Used to build fixtures.
pub fn encode_fields(fields: &[Bytes32]) -> String {
    let mut out = String::with_capacity(2 + fields.len() * FIELD_BYTES * 2);
    out.push_str("0x");
    for field in fields {
        out.push_str(&hex::encode(field.as_bytes()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof(hex: String) -> ProofResult {
        ProofResult {
            name: "compare_age".into(),
            proof: hex,
            vkey_hash: None,
            version: None,
            committed_inputs: None,
            index: None,
            total: None,
        }
    }

    #[test]
    fn test_fields_split() {
        let words = vec![Bytes32::from_u64(1), Bytes32::from_u64(2), Bytes32::from_u64(3)];
        let p = proof(encode_fields(&words));
        assert_eq!(p.fields().unwrap(), words);
        assert_eq!(p.public_inputs(2).unwrap(), words[..2].to_vec());
        assert!(p.public_inputs(4).is_err());
    }

    #[test]
    fn test_rejects_ragged_proof() {
        let p = proof("0xabcd".into());
        assert!(p.fields().is_err());
    }
}
