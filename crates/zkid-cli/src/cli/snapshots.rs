use super::commands::{CertsAction, CircuitsAction, OutputFormat};
use super::utils::{emit, parse_optional_bytes32, read_json_file, OK};
use anyhow::Result;
use serde_json::json;
use std::path::Path;
use zkid_cli::AppConfig;
use zkid_registry::{
    parse_certificates_file, parse_circuit_manifest, parse_packaged_circuit, validate_certificates,
    validate_circuit_manifest, validate_packaged_circuit, RegistryClient,
};

pub async fn handle_certs(config: &AppConfig, action: CertsAction, format: OutputFormat) -> Result<()> {
    match action {
        CertsAction::Validate { file, root } => {
            let packaged = parse_certificates_file(read_json_file(&file)?)?;
            let root = match parse_optional_bytes32(root.as_deref())? {
                Some(root) => root,
                None => RegistryClient::new(config.registry.clone())?.certificates_root().await?,
            };

            validate_certificates(&packaged.certificates, packaged.version, &root)?;

            let value = json!({
                "valid": true,
                "root": root,
                "certificates": packaged.certificates.len(),
            });
            emit(format, &value, |_| {
                println!(
                    "{} {} certificates match root {}",
                    OK,
                    packaged.certificates.len(),
                    root
                );
            })?;
        }
    }
    Ok(())
}

pub fn handle_circuits(action: CircuitsAction, format: OutputFormat) -> Result<()> {
    match action {
        CircuitsAction::ValidateManifest { file, root } => {
            let manifest = parse_circuit_manifest(read_json_file(&file)?)?;
            let root = parse_optional_bytes32(root.as_deref())?;
            validate_circuit_manifest(&manifest, root.as_ref())?;

            let checked = root.unwrap_or(manifest.root);
            let value = json!({
                "valid": true,
                "version": manifest.version,
                "root": checked,
                "circuits": manifest.circuits.len(),
            });
            emit(format, &value, |_| {
                println!(
                    "{} Manifest {} with {} circuits matches root {}",
                    OK,
                    manifest.version,
                    manifest.circuits.len(),
                    checked
                );
            })?;
        }
        CircuitsAction::ValidatePackaged { file, hash } => {
            let circuit = parse_packaged_circuit(&circuit_label(&file), read_json_file(&file)?)?;
            let hash = parse_optional_bytes32(hash.as_deref())?;
            validate_packaged_circuit(&circuit, hash.as_ref())?;

            let value = json!({
                "valid": true,
                "name": circuit.name,
                "vkey_hash": circuit.vkey_hash,
            });
            emit(format, &value, |_| {
                println!("{} Circuit {} verification key matches {}", OK, circuit.name, circuit.vkey_hash);
            })?;
        }
    }
    Ok(())
}

fn circuit_label(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}
