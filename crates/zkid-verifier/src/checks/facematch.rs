use serde::{Deserialize, Serialize};
use zkid_types::{
    Bytes32, ConstraintError, ConstraintKind, ErrorReport, FacematchCommittedInputs,
    FacematchEnvironment, FieldKey, QueryResult,
};

use super::fail;

/// Hash of the Apple App Attestation root key.
pub const APPLE_APP_ATTEST_ROOT_KEY_HASH: Bytes32 = Bytes32([
    0x25, 0x32, 0x41, 0x8a, 0x10, 0x7c, 0x53, 0x06, 0xfa, 0x83, 0x08, 0xc2, 0x22, 0x55, 0x79, 0x2c,
    0xf7, 0x7e, 0x4a, 0x29, 0x0c, 0xbc, 0xe8, 0xa8, 0x40, 0xa6, 0x42, 0xa3, 0xe5, 0x91, 0x34, 0x0b,
]);

/// Hash of the ZKPassport mobile app id.
pub const ZKPASSPORT_APP_ID_HASH: Bytes32 = Bytes32([
    0x1f, 0xa7, 0x36, 0x86, 0xcf, 0x51, 0x0f, 0x8f, 0x85, 0x75, 0x7b, 0x06, 0x02, 0xde, 0x0d, 0xd7,
    0x2a, 0x13, 0xe6, 0x8a, 0xe2, 0x09, 0x24, 0x62, 0xbe, 0x8b, 0x72, 0x66, 0x2e, 0x7f, 0x17, 0x9b,
]);

/// Attestation roots and app ids a facematch proof may come from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacematchPolicy {
    pub root_key_hashes: Vec<Bytes32>,
    pub app_id_hashes: Vec<Bytes32>,
}

impl Default for FacematchPolicy {
    fn default() -> Self {
        Self {
            root_key_hashes: vec![APPLE_APP_ATTEST_ROOT_KEY_HASH],
            app_id_hashes: vec![ZKPASSPORT_APP_ID_HASH],
        }
    }
}

impl FacematchPolicy {
    pub fn with_root_key(mut self, hash: Bytes32) -> Self {
        if !self.root_key_hashes.contains(&hash) {
            self.root_key_hashes.push(hash);
        }
        self
    }

    pub fn with_app_id(mut self, hash: Bytes32) -> Self {
        if !self.app_id_hashes.contains(&hash) {
            self.app_id_hashes.push(hash);
        }
        self
    }
}

pub fn check_facematch(
    inputs: &FacematchCommittedInputs,
    result: &QueryResult,
    policy: &FacematchPolicy,
    dev_mode: bool,
) -> ErrorReport {
    let mut report = ErrorReport::new();
    let key = FieldKey::Facematch;
    let Some(facematch) = result.facematch.as_ref().filter(|f| f.passed) else {
        return report;
    };

    if !policy.root_key_hashes.contains(&inputs.root_key_leaf) {
        fail(
            &mut report,
            key,
            ConstraintKind::Eq,
            ConstraintError::new("Invalid facematch root key hash").received(inputs.root_key_leaf),
        );
    }

    if !dev_mode && inputs.environment != FacematchEnvironment::Production {
        fail(
            &mut report,
            key,
            ConstraintKind::Eq,
            ConstraintError::new("Invalid facematch environment, it should be production")
                .expected("production")
                .received(format!("{:?}", inputs.environment).to_lowercase()),
        );
    }

    if !policy.app_id_hashes.contains(&inputs.app_id_hash) {
        fail(
            &mut report,
            key,
            ConstraintKind::Eq,
            ConstraintError::new(
                "Invalid facematch app id hash, the attestation should be coming from the ZKPassport app",
            )
            .received(inputs.app_id_hash),
        );
    }

    if inputs.mode != facematch.mode {
        fail(
            &mut report,
            key,
            ConstraintKind::Eq,
            ConstraintError::new("Facematch mode does not match the one from the query results")
                .expected(format!("{:?}", facematch.mode).to_lowercase())
                .received(format!("{:?}", inputs.mode).to_lowercase()),
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkid_types::{FacematchMode, FacematchResult};

    fn inputs(environment: FacematchEnvironment) -> FacematchCommittedInputs {
        FacematchCommittedInputs {
            root_key_leaf: APPLE_APP_ATTEST_ROOT_KEY_HASH,
            environment,
            app_id_hash: ZKPASSPORT_APP_ID_HASH,
            integrity_pubkey_hash: Bytes32::from_u64(1),
            mode: FacematchMode::Strict,
        }
    }

    fn result(mode: FacematchMode) -> QueryResult {
        QueryResult {
            facematch: Some(FacematchResult { mode, passed: true }),
            ..Default::default()
        }
    }

    #[test]
    fn test_production_attestation_accepted() {
        let report = check_facematch(
            &inputs(FacematchEnvironment::Production),
            &result(FacematchMode::Strict),
            &FacematchPolicy::default(),
            false,
        );
        assert!(report.is_empty());
    }

    #[test]
    fn test_development_needs_dev_mode() {
        let dev = inputs(FacematchEnvironment::Development);
        let policy = FacematchPolicy::default();
        let report = check_facematch(&dev, &result(FacematchMode::Strict), &policy, false);
        assert_eq!(
            report.errors(FieldKey::Facematch, ConstraintKind::Eq)[0].message,
            "Invalid facematch environment, it should be production"
        );
        assert!(check_facematch(&dev, &result(FacematchMode::Strict), &policy, true).is_empty());
    }

    #[test]
    fn test_unknown_app_and_mode_mismatch() {
        let mut other = inputs(FacematchEnvironment::Production);
        other.app_id_hash = Bytes32::from_u64(5);
        let report = check_facematch(&other, &result(FacematchMode::Regular), &FacematchPolicy::default(), false);
        assert_eq!(report.count(), 2);

        let policy = FacematchPolicy::default().with_app_id(Bytes32::from_u64(5));
        let report = check_facematch(&other, &result(FacematchMode::Strict), &policy, false);
        assert!(report.is_empty());
    }

    #[test]
    fn test_constants_hex() {
        assert_eq!(
            APPLE_APP_ATTEST_ROOT_KEY_HASH.to_hex(),
            "0x2532418a107c5306fa8308c22255792cf77e4a290cbce8a840a642a3e591340b"
        );
        assert_eq!(
            ZKPASSPORT_APP_ID_HASH.to_hex(),
            "0x1fa73686cf510f8f85757b0602de0dd72a13e68ae2092462be8b72662e7f179b"
        );
    }
}
