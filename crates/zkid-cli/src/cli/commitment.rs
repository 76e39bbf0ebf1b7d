use super::commands::OutputFormat;
use super::utils::{emit, read_json_arg};
use anyhow::{anyhow, Result};
use serde_json::json;
use zkid_crypto::ParameterCommitmentCodec;
use zkid_types::{Bytes32, ClaimKind, CommittedInput};

/// Accepts a circuit name with or without the `_evm` suffix.
pub fn compute_commitment(kind: &str, inputs: serde_json::Value, evm: bool) -> Result<(String, Bytes32)> {
    let (kind, suffixed) = ClaimKind::from_circuit_name(kind)
        .ok_or_else(|| anyhow!("Unknown claim circuit: {}", kind))?;
    let evm = evm || suffixed;
    let input = CommittedInput::from_value(kind, inputs)?;
    let commitment = ParameterCommitmentCodec::new().compute(kind, &input, evm)?;

    let circuit = if evm {
        format!("{}_evm", kind.circuit_name())
    } else {
        kind.circuit_name().to_string()
    };
    Ok((circuit, commitment))
}

pub fn handle_commitment(kind: &str, inputs: &str, evm: bool, format: OutputFormat) -> Result<()> {
    let (circuit, commitment) = compute_commitment(kind, read_json_arg(inputs)?, evm)?;
    let value = json!({
        "circuit": circuit,
        "commitment": commitment,
    });
    emit(format, &value, |_| println!("{}: {}", circuit, commitment))
}
