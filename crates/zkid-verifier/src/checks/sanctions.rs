use zkid_types::{
    Bytes32, ConstraintError, ConstraintKind, ErrorReport, FieldKey, QueryResult,
    SanctionsCommittedInputs,
};

use super::fail;

/// Checks the sanctions registry root and strictness a sanctions-exclusion
/// proof committed to. `expected_root` of `None` accepts any root.
pub fn check_sanctions(
    inputs: &SanctionsCommittedInputs,
    result: &QueryResult,
    expected_root: Option<&Bytes32>,
) -> ErrorReport {
    let mut report = ErrorReport::new();
    let key = FieldKey::Sanctions;
    let Some(sanctions) = result.sanctions.as_ref().filter(|s| s.passed) else {
        return report;
    };

    if let Some(root) = expected_root {
        if *root != inputs.root_hash {
            fail(
                &mut report,
                key,
                ConstraintKind::Eq,
                ConstraintError::new("Invalid sanctions registry root")
                    .expected(root)
                    .received(inputs.root_hash),
            );
        }
    }

    if inputs.is_strict != sanctions.is_strict {
        fail(
            &mut report,
            key,
            ConstraintKind::Eq,
            ConstraintError::new("Sanctions strict mode does not match the one from the query results")
                .expected(sanctions.is_strict)
                .received(inputs.is_strict),
        );
    }
    report
}
