use crate::checks::FacematchPolicy;
use serde::{Deserialize, Serialize};
use zkid_types::{Bytes32, ZkidError, ZkidResult, DEFAULT_VALIDITY_SECS};

/// Settings that shape how a proof bundle is judged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Relying-party domain the proofs must be scoped to.
    pub domain: Option<String>,
    pub scope: Option<String>,
    /// Maximum age of the proof's current date, in seconds.
    pub validity_secs: i64,
    /// Accepts mock documents and development facematch attestations.
    pub dev_mode: bool,
    pub sanctions_root: Option<Bytes32>,
    /// Extra attestation roots accepted on top of the built-in ones.
    pub facematch_root_keys: Vec<Bytes32>,
    pub facematch_app_ids: Vec<Bytes32>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            domain: None,
            scope: None,
            validity_secs: DEFAULT_VALIDITY_SECS,
            dev_mode: false,
            sanctions_root: None,
            facematch_root_keys: Vec::new(),
            facematch_app_ids: Vec::new(),
        }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> ZkidResult<()> {
        if self.validity_secs <= 0 {
            return Err(ZkidError::Config(format!(
                "validity_secs must be positive, got {}",
                self.validity_secs
            )));
        }
        if let Some(domain) = &self.domain {
            if domain.trim().is_empty() {
                return Err(ZkidError::Config("domain must not be empty".into()));
            }
        }
        Ok(())
    }

    pub fn facematch_policy(&self) -> FacematchPolicy {
        let policy = self
            .facematch_root_keys
            .iter()
            .fold(FacematchPolicy::default(), |policy, key| policy.with_root_key(*key));
        self.facematch_app_ids
            .iter()
            .fold(policy, |policy, id| policy.with_app_id(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{APPLE_APP_ATTEST_ROOT_KEY_HASH, ZKPASSPORT_APP_ID_HASH};

    #[test]
    fn test_defaults_validate() {
        let config = VerifierConfig::default();
        assert_eq!(config.validity_secs, DEFAULT_VALIDITY_SECS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = VerifierConfig {
            validity_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ZkidError::Config(_))));

        let config = VerifierConfig {
            domain: Some("  ".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: VerifierConfig = serde_json::from_str(r#"{"domain": "example.com", "dev_mode": true}"#).unwrap();
        assert_eq!(config.domain.as_deref(), Some("example.com"));
        assert!(config.dev_mode);
        assert_eq!(config.validity_secs, DEFAULT_VALIDITY_SECS);
    }

    #[test]
    fn test_facematch_policy_extends_builtins() {
        let extra = Bytes32::from_u64(42);
        let config = VerifierConfig {
            facematch_root_keys: vec![extra],
            ..Default::default()
        };
        let policy = config.facematch_policy();
        assert_eq!(policy.root_key_hashes, vec![APPLE_APP_ATTEST_ROOT_KEY_HASH, extra]);
        assert_eq!(policy.app_id_hashes, vec![ZKPASSPORT_APP_ID_HASH]);
    }
}
