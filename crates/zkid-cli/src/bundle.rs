use serde::{Deserialize, Serialize};
use std::path::Path;
use zkid_types::{ProofResult, Query, QueryResult, ZkidError, ZkidResult};

/// Everything needed to verify one disclosure offline: the holder's proofs,
/// the original request, and the holder's claimed answers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationBundle {
    pub proofs: Vec<ProofResult>,
    #[serde(default)]
    pub query: Query,
    #[serde(default, alias = "queryResult")]
    pub query_result: QueryResult,
}

impl VerificationBundle {
    pub fn from_json(contents: &str) -> ZkidResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ZkidResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ZkidError::InvalidInput(format!("Failed to read bundle {:?}: {}", path, e)))?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkid_types::IdField;

    #[test]
    fn test_parse_bundle() {
        let bundle = VerificationBundle::from_json(
            r#"{
                "proofs": [{"name": "sig_check_dsc_tbs_700_rsa_pkcs_4096", "proof": "0x00"}],
                "query": {"age": {"gte": 18}},
                "queryResult": {"age": {"gte": {"expected": 18, "result": true}}}
            }"#,
        )
        .unwrap();

        assert_eq!(bundle.proofs.len(), 1);
        assert!(bundle.query.field(IdField::Age).is_some());
        assert!(bundle.query_result.field(IdField::Age).is_some());
    }

    #[test]
    fn test_missing_sections_default() {
        let bundle = VerificationBundle::from_json(r#"{"proofs": []}"#).unwrap();
        assert_eq!(bundle, VerificationBundle::default());
    }

    #[test]
    fn test_bundle_without_proofs_rejected() {
        assert!(matches!(
            VerificationBundle::from_json(r#"{"query": {}}"#),
            Err(ZkidError::Serialization(_))
        ));
    }
}
