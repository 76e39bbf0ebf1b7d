mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{
    handle_certs, handle_circuits, handle_commitment, handle_config, handle_registry,
    handle_verify, init_logging, Cli, Commands,
};
use std::process::ExitCode;
use zkid_cli::AppConfig;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);

    if let Commands::Config { action } = cli.command {
        handle_config(&config_path, action, cli.format)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = AppConfig::load(&config_path)?;
    init_logging(&cli, &config.logging)?;

    match cli.command {
        Commands::Verify(args) => {
            if !handle_verify(&config, args, cli.format).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Registry { action } => {
            handle_registry(&config, action, cli.format).await?;
        }
        Commands::Certs { action } => {
            handle_certs(&config, action, cli.format).await?;
        }
        Commands::Circuits { action } => {
            handle_circuits(action, cli.format)?;
        }
        Commands::Commitment { kind, inputs, evm } => {
            handle_commitment(&kind, &inputs, evm, cli.format)?;
        }
        Commands::Config { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}
