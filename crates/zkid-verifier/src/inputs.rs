//! Public-input layouts of each circuit stage.
//!
//! A proof starts with its public inputs as 32-byte big-endian words:
//!
//! | stage      | public inputs |
//! |------------|---------------|
//! | DSC        | `certificate_root, commitment_out` |
//! | ID data    | `commitment_in, commitment_out` |
//! | integrity  | `commitment_in, current_date, commitment_out` |
//! | disclosure | `commitment_in, service_scope, service_subscope, param_commitment, nullifier_type, nullifier` |
//! | outer      | `certificate_root, circuit_root, current_date, service_scope, service_subscope, param_commitments.., nullifier_type, nullifier` |

use zkid_types::{
    Bytes32, CircuitStage, ClaimKind, Nullifier, NullifierKind, ProofResult, ZkidError,
    ZkidResult,
};

pub const DSC_PUBLIC_INPUTS: usize = 2;
pub const ID_DATA_PUBLIC_INPUTS: usize = 2;
pub const INTEGRITY_PUBLIC_INPUTS: usize = 3;
pub const DISCLOSURE_PUBLIC_INPUTS: usize = 6;

/// Outer proofs verify three chain stages plus `N - 3` claim proofs.
const OUTER_CHAIN_STAGES: usize = 3;
const OUTER_FIXED_INPUTS: usize = 7;
/// Every claim circuit at most once on top of the chain.
pub const MAX_OUTER_SUBPROOFS: usize = OUTER_CHAIN_STAGES + ClaimKind::ALL.len();

/// Number of public inputs a stage exposes. `None` for unknown stages and
/// outer proofs with fewer than three or more than [`MAX_OUTER_SUBPROOFS`]
/// subproofs.
pub fn public_input_count(stage: &CircuitStage) -> Option<usize> {
    match stage {
        CircuitStage::Dsc => Some(DSC_PUBLIC_INPUTS),
        CircuitStage::IdData => Some(ID_DATA_PUBLIC_INPUTS),
        CircuitStage::Integrity => Some(INTEGRITY_PUBLIC_INPUTS),
        CircuitStage::Claim { .. } => Some(DISCLOSURE_PUBLIC_INPUTS),
        CircuitStage::Outer { subproofs, .. } if *subproofs <= MAX_OUTER_SUBPROOFS => subproofs
            .checked_sub(OUTER_CHAIN_STAGES)
            .and_then(|claims| OUTER_FIXED_INPUTS.checked_add(claims)),
        CircuitStage::Outer { .. } => None,
        CircuitStage::Unknown => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DscInputs {
    pub certificate_root: Bytes32,
    pub commitment_out: Bytes32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdDataInputs {
    pub commitment_in: Bytes32,
    pub commitment_out: Bytes32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegrityInputs {
    pub commitment_in: Bytes32,
    pub current_date: i64,
    pub commitment_out: Bytes32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisclosureInputs {
    pub commitment_in: Bytes32,
    pub service_scope: Bytes32,
    pub service_subscope: Bytes32,
    pub param_commitment: Bytes32,
    pub nullifier_type: Bytes32,
    pub nullifier: Bytes32,
}

impl DisclosureInputs {
    /// `None` when the type slot holds an unknown value.
    pub fn nullifier(&self) -> Option<Nullifier> {
        read_nullifier(&self.nullifier_type, &self.nullifier)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OuterInputs {
    pub certificate_root: Bytes32,
    pub circuit_root: Bytes32,
    pub current_date: i64,
    pub service_scope: Bytes32,
    pub service_subscope: Bytes32,
    pub param_commitments: Vec<Bytes32>,
    pub nullifier_type: Bytes32,
    pub nullifier: Bytes32,
}

impl OuterInputs {
    pub fn nullifier(&self) -> Option<Nullifier> {
        read_nullifier(&self.nullifier_type, &self.nullifier)
    }
}

/// Public inputs of one proof, decoded per its stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageInputs {
    Dsc(DscInputs),
    IdData(IdDataInputs),
    Integrity(IntegrityInputs),
    Disclosure(DisclosureInputs),
    Outer(OuterInputs),
}

impl StageInputs {
    pub fn read(proof: &ProofResult) -> ZkidResult<Self> {
        let stage = proof.stage();
        let count = public_input_count(&stage).ok_or_else(|| {
            ZkidError::InvalidInput(format!("No public-input layout for proof {}", proof.name))
        })?;
        let fields = proof.public_inputs(count)?;

        let inputs = match stage {
            CircuitStage::Dsc => StageInputs::Dsc(DscInputs {
                certificate_root: fields[0],
                commitment_out: fields[1],
            }),
            CircuitStage::IdData => StageInputs::IdData(IdDataInputs {
                commitment_in: fields[0],
                commitment_out: fields[1],
            }),
            CircuitStage::Integrity => StageInputs::Integrity(IntegrityInputs {
                commitment_in: fields[0],
                current_date: read_date(&fields[1])?,
                commitment_out: fields[2],
            }),
            CircuitStage::Claim { .. } => StageInputs::Disclosure(DisclosureInputs {
                commitment_in: fields[0],
                service_scope: fields[1],
                service_subscope: fields[2],
                param_commitment: fields[3],
                nullifier_type: fields[4],
                nullifier: fields[5],
            }),
            CircuitStage::Outer { .. } => {
                let len = fields.len();
                StageInputs::Outer(OuterInputs {
                    certificate_root: fields[0],
                    circuit_root: fields[1],
                    current_date: read_date(&fields[2])?,
                    service_scope: fields[3],
                    service_subscope: fields[4],
                    param_commitments: fields[5..len - 2].to_vec(),
                    nullifier_type: fields[len - 2],
                    nullifier: fields[len - 1],
                })
            }
            CircuitStage::Unknown => {
                return Err(ZkidError::InvalidInput(format!("Unknown circuit {}", proof.name)))
            }
        };
        Ok(inputs)
    }
}

fn read_date(field: &Bytes32) -> ZkidResult<i64> {
    field
        .to_u64()
        .and_then(|secs| i64::try_from(secs).ok())
        .ok_or_else(|| ZkidError::InvalidInput(format!("Current date out of range: {}", field)))
}

fn read_nullifier(kind: &Bytes32, value: &Bytes32) -> Option<Nullifier> {
    NullifierKind::from_field(kind).map(|kind| Nullifier { value: *value, kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkid_types::encode_fields;

    fn proof(name: &str, words: &[u64]) -> ProofResult {
        let fields: Vec<Bytes32> = words.iter().map(|w| Bytes32::from_u64(*w)).collect();
        ProofResult {
            name: name.to_string(),
            proof: encode_fields(&fields),
            vkey_hash: None,
            version: None,
            committed_inputs: None,
            index: None,
            total: None,
        }
    }

    #[test]
    fn test_counts() {
        assert_eq!(public_input_count(&CircuitStage::Dsc), Some(2));
        assert_eq!(public_input_count(&CircuitStage::Integrity), Some(3));
        assert_eq!(
            public_input_count(&CircuitStage::Claim { kind: ClaimKind::Age, evm: false }),
            Some(6)
        );
        assert_eq!(
            public_input_count(&CircuitStage::Outer { evm: false, subproofs: 5 }),
            Some(9)
        );
        assert_eq!(public_input_count(&CircuitStage::Outer { evm: false, subproofs: 2 }), None);
        assert_eq!(
            public_input_count(&CircuitStage::Outer { evm: false, subproofs: 14 }),
            Some(18)
        );
        assert_eq!(public_input_count(&CircuitStage::Outer { evm: false, subproofs: 15 }), None);
        assert_eq!(public_input_count(&CircuitStage::Unknown), None);
    }

    #[test]
    fn test_integrity_layout() {
        let p = proof("data_check_integrity_sa_sha256_dg_sha256", &[7, 1_735_689_600, 8, 99]);
        assert_eq!(
            StageInputs::read(&p).unwrap(),
            StageInputs::Integrity(IntegrityInputs {
                commitment_in: Bytes32::from_u64(7),
                current_date: 1_735_689_600,
                commitment_out: Bytes32::from_u64(8),
            })
        );
    }

    #[test]
    fn test_disclosure_nullifier() {
        let p = proof("compare_age", &[1, 2, 3, 4, 1, 55, 0]);
        match StageInputs::read(&p).unwrap() {
            StageInputs::Disclosure(d) => {
                let nullifier = d.nullifier().unwrap();
                assert_eq!(nullifier.kind, NullifierKind::Salted);
                assert_eq!(nullifier.value, Bytes32::from_u64(55));
            }
            other => panic!("unexpected layout: {:?}", other),
        }

        let bad = proof("compare_age", &[1, 2, 3, 4, 9, 55]);
        match StageInputs::read(&bad).unwrap() {
            StageInputs::Disclosure(d) => assert!(d.nullifier().is_none()),
            other => panic!("unexpected layout: {:?}", other),
        }
    }

    #[test]
    fn test_outer_param_commitments() {
        let p = proof("outer_count_5", &[10, 11, 1_735_689_600, 12, 13, 20, 21, 0, 77, 1000]);
        match StageInputs::read(&p).unwrap() {
            StageInputs::Outer(o) => {
                assert_eq!(o.param_commitments, vec![Bytes32::from_u64(20), Bytes32::from_u64(21)]);
                assert_eq!(o.nullifier, Bytes32::from_u64(77));
                assert_eq!(o.nullifier().unwrap().kind, NullifierKind::NonSalted);
            }
            other => panic!("unexpected layout: {:?}", other),
        }
    }

    #[test]
    fn test_short_proof_rejected() {
        let p = proof("sig_check_id_data_tbs_700", &[1]);
        assert!(StageInputs::read(&p).is_err());
        assert!(StageInputs::read(&proof("mystery", &[1, 2, 3])).is_err());
    }

    #[test]
    fn test_outer_subproof_count_out_of_range() {
        let p = proof("outer_count_18446744073709551615", &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(
            p.stage(),
            CircuitStage::Outer { evm: false, subproofs: usize::MAX }
        );
        assert!(matches!(StageInputs::read(&p), Err(ZkidError::InvalidInput(_))));
        assert!(StageInputs::read(&proof("outer_count_15", &[0; 22])).is_err());
    }
}
