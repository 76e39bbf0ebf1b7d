use zkid_types::{BindCommittedInputs, ConstraintError, ConstraintKind, ErrorReport, FieldKey, QueryResult};

use super::fail;

/// Data bound into the proof must match what the holder reported.
pub fn check_bind(inputs: &BindCommittedInputs, result: &QueryResult) -> ErrorReport {
    let mut report = ErrorReport::new();
    let key = FieldKey::Bind;
    let Some(bound) = &result.bind else {
        return report;
    };
    let committed = &inputs.data;

    let address = |a: &Option<String>| a.as_deref().map(normalize_address);
    if address(&committed.user_address) != address(&bound.user_address) {
        fail(
            &mut report,
            key,
            ConstraintKind::Eq,
            ConstraintError::new("Bound user address does not match the one from the query results")
                .expected(bound.user_address.clone().unwrap_or_default())
                .received(committed.user_address.clone().unwrap_or_default()),
        );
    }

    if committed.chain != bound.chain {
        fail(
            &mut report,
            key,
            ConstraintKind::Eq,
            ConstraintError::new("Bound chain id does not match the one from the query results")
                .expected(format!("{:?}", bound.chain))
                .received(format!("{:?}", committed.chain)),
        );
    }

    let custom = |d: &Option<String>| d.as_deref().map(|s| s.trim().to_lowercase());
    if custom(&committed.custom_data) != custom(&bound.custom_data) {
        fail(
            &mut report,
            key,
            ConstraintKind::Eq,
            ConstraintError::new("Bound custom data does not match the one from the query results")
                .expected(bound.custom_data.clone().unwrap_or_default())
                .received(committed.custom_data.clone().unwrap_or_default()),
        );
    }
    report
}

fn normalize_address(address: &str) -> String {
    let lower = address.trim().to_lowercase();
    lower.strip_prefix("0x").map(str::to_string).unwrap_or(lower)
}
