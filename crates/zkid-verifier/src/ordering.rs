use zkid_types::ProofResult;

/// Chain order of proof names: certificate signature, ID signature,
/// integrity, then the claim proofs.
pub const PROOF_ORDER: [&str; 14] = [
    "sig_check_dsc",
    "sig_check_id_data",
    "data_check_integrity",
    "disclose_bytes",
    "compare_age",
    "compare_birthdate",
    "compare_expiry",
    "exclusion_check_nationality",
    "inclusion_check_nationality",
    "exclusion_check_issuing_country",
    "inclusion_check_issuing_country",
    "bind",
    "exclusion_check_sanctions",
    "facematch",
];

/// Position of `name` by prefix match. Unmatched names, `outer` proofs
/// included, sort after every listed stage.
pub fn order_index(name: &str) -> usize {
    PROOF_ORDER
        .iter()
        .position(|prefix| name.starts_with(prefix))
        .unwrap_or(PROOF_ORDER.len())
}

/// Stable sort into chain order.
pub fn sort_proofs(proofs: &mut [ProofResult]) {
    proofs.sort_by_key(|proof| order_index(&proof.name));
}
