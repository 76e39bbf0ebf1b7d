use super::commands::{OutputFormat, RegistryAction, RegistryKind};
use super::utils::{emit, parse_optional_bytes32, DIM, RESET};
use anyhow::Result;
use serde_json::json;
use zkid_cli::AppConfig;
use zkid_registry::{bytes32_to_cid, RegistryClient};
use zkid_types::{RootDetails, CERTIFICATE_REGISTRY_ID, CIRCUIT_REGISTRY_ID};

impl RegistryKind {
    pub fn registry_id(self) -> u64 {
        match self {
            RegistryKind::Certificate => CERTIFICATE_REGISTRY_ID,
            RegistryKind::Circuit => CIRCUIT_REGISTRY_ID,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RegistryKind::Certificate => "certificate",
            RegistryKind::Circuit => "circuit",
        }
    }
}

pub async fn handle_registry(config: &AppConfig, action: RegistryAction, format: OutputFormat) -> Result<()> {
    let client = RegistryClient::new(config.registry.clone())?;
    let rpc = client.rpc();

    match action {
        RegistryAction::Root { registry } => {
            let root = rpc.latest_root(registry.registry_id()).await?;
            let value = json!({
                "registry": registry.label(),
                "root": root,
                "cid": bytes32_to_cid(&root),
            });
            emit(format, &value, |_| {
                println!("Latest {} root: {}", registry.label(), root);
                println!("    {}CID:{} {}", DIM, RESET, bytes32_to_cid(&root));
            })?;
        }
        RegistryAction::Details { registry, root } => {
            let root = parse_optional_bytes32(root.as_deref())?;
            let details = rpc.get_root_details(registry.registry_id(), root.as_ref()).await?;
            emit(format, &details, print_details)?;
        }
        RegistryAction::History { registry, page_size } => {
            let roots = rpc
                .get_all_historical_roots(registry.registry_id(), page_size, |progress| {
                    tracing::debug!(
                        "Page {}: {} roots ({} total)",
                        progress.page_number,
                        progress.page_roots.len(),
                        progress.total_so_far
                    );
                })
                .await?;
            emit(format, &roots, |roots| {
                println!("{} {} roots:", roots.len(), registry.label());
                for details in roots {
                    print_details(details);
                }
            })?;
        }
        RegistryAction::Address { registry } => {
            let address = rpc.get_registry_address(registry.registry_id()).await?;
            let value = json!({
                "registry": registry.label(),
                "address": address.to_string(),
            });
            emit(format, &value, |_| {
                println!("{} registry: {}", registry.label(), address);
            })?;
        }
    }
    Ok(())
}

fn print_details(details: &RootDetails) {
    let status = if details.revoked {
        "revoked"
    } else if details.is_latest {
        "latest"
    } else {
        "superseded"
    };
    println!("#{} {} [{}]", details.index, details.root, status);
    println!("    {}valid from:{} {}", DIM, RESET, details.valid_from.to_rfc3339());
    if let Some(valid_to) = details.valid_to {
        println!("    {}valid to:{}   {}", DIM, RESET, valid_to.to_rfc3339());
    }
    println!("    {}leaves:{}     {}", DIM, RESET, details.leaves);
    println!("    {}cid:{}        {}", DIM, RESET, details.cid);
}
