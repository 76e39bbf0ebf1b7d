use super::commands::{OutputFormat, VerifyArgs};
use super::utils::{emit, DIM, FAIL, OK, RESET};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use zkid_cli::{AppConfig, VerificationBundle};
use zkid_registry::{RegistryClient, RootValidator};
use zkid_types::VerificationVerdict;
use zkid_verifier::{ProofChainValidator, Session, VerifierConfig};

/// Returns whether the bundle verified.
pub async fn handle_verify(config: &AppConfig, args: VerifyArgs, format: OutputFormat) -> Result<bool> {
    let verifier = verifier_config(config, &args);
    let bundle = VerificationBundle::load(&args.bundle)?;
    info!(
        "Verifying {} proofs from {:?} on chain {}",
        bundle.proofs.len(),
        args.bundle,
        config.registry.chain_id
    );

    let roots: Arc<dyn RootValidator> = Arc::new(RegistryClient::new(config.registry.clone())?);
    let validator = ProofChainValidator::from_config(&verifier, roots)?;
    let mut session = Session::from_config(&verifier, bundle.query)?;
    if session.dev_mode {
        warn!("Development mode: mock documents are accepted");
    }

    let verdict = validator
        .verify(&mut session, bundle.proofs, &bundle.query_result)
        .await?;

    emit(format, &verdict, print_verdict)?;
    Ok(verdict.verified)
}

fn verifier_config(config: &AppConfig, args: &VerifyArgs) -> VerifierConfig {
    let mut verifier = config.verifier.clone();
    if let Some(domain) = &args.domain {
        verifier.domain = Some(domain.clone());
    }
    if let Some(scope) = &args.scope {
        verifier.scope = Some(scope.clone());
    }
    if let Some(validity) = args.validity {
        verifier.validity_secs = validity;
    }
    verifier.dev_mode |= args.dev_mode;
    verifier
}

fn print_verdict(verdict: &VerificationVerdict) {
    if verdict.verified {
        println!("{} Proofs verified", OK);
        if let Some(identifier) = &verdict.unique_identifier {
            println!("    Unique identifier: {}", identifier);
        }
        if let Some(kind) = &verdict.unique_identifier_kind {
            println!("    Identifier type:   {:?}", kind);
        }
        return;
    }

    println!("{} Verification failed", FAIL);
    let report = &verdict.field_errors;
    if report.is_empty() {
        println!("    {}No proofs were provided{}", DIM, RESET);
        return;
    }

    for key in report.keys() {
        let Some(errors) = report.get(*key) else { continue };
        for (kind, list) in errors {
            for error in list {
                println!("    {} ({:?}): {}", key, kind, error.message);
                if let Some(expected) = &error.expected {
                    println!("      {}expected:{} {}", DIM, RESET, expected);
                }
                if let Some(received) = &error.received {
                    println!("      {}received:{} {}", DIM, RESET, received);
                }
            }
        }
    }
}
