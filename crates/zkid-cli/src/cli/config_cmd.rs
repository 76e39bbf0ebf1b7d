use super::commands::{ConfigAction, OutputFormat};
use super::utils::{DIM, FAIL, OK, RESET};
use anyhow::{bail, Context, Result};
use std::path::Path;
use zkid_cli::AppConfig;
use zkid_registry::RegistryConfig;

pub fn handle_config(config_path: &Path, action: Option<ConfigAction>, format: OutputFormat) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            if !config_path.exists() {
                eprintln!("{}No configuration file found at {:?}, showing defaults{}", DIM, config_path, RESET);
            }
            match AppConfig::load(config_path) {
                Ok(config) => match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                    OutputFormat::Text => print!("{}", config.to_toml()?),
                },
                Err(e) => {
                    let content = std::fs::read_to_string(config_path)
                        .with_context(|| format!("Failed to read {:?}", config_path))?;
                    println!("{}", content);
                    eprintln!("{} Configuration error: {}", FAIL, e);
                }
            }
        }
        Some(ConfigAction::Init { force, chain }) => {
            init_config(config_path, force, chain)?;
            println!("{} Configuration written to {:?}", OK, config_path);
        }
        Some(ConfigAction::Path) => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}

fn init_config(config_path: &Path, force: bool, chain: Option<u64>) -> Result<AppConfig> {
    if config_path.exists() && !force {
        bail!("Configuration already exists at {:?}. Use --force to overwrite", config_path);
    }

    let config = AppConfig {
        registry: chain.map(RegistryConfig::for_chain).unwrap_or_default(),
        ..Default::default()
    };
    config.validate()?;
    config.save(config_path)?;
    Ok(config)
}
