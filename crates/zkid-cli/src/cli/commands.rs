use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "zkid")]
#[command(version = BUILD_VERSION)]
#[command(about = "zkid - Verify zero-knowledge identity proofs against the on-chain registry")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true, value_name = "FILE", help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(long, global = true, value_name = "FILE", help = "Write logs to file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text", help = "Output format")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Verify a proof bundle")]
    #[command(long_about = "Verify a proof bundle.\n\nThe bundle is a JSON file with `proofs`, `query` and `query_result`. Roots are checked against the configured registry.")]
    Verify(VerifyArgs),

    #[command(about = "Query the on-chain root registry")]
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },

    #[command(about = "Validate packaged certificates")]
    Certs {
        #[command(subcommand)]
        action: CertsAction,
    },

    #[command(about = "Validate circuit manifests and packaged circuits")]
    Circuits {
        #[command(subcommand)]
        action: CircuitsAction,
    },

    #[command(about = "Compute a parameter commitment")]
    Commitment {
        #[arg(long, value_name = "CIRCUIT", help = "Claim circuit name, e.g. compare_age")]
        kind: String,
        #[arg(long, value_name = "JSON", help = "Committed inputs as inline JSON or @file")]
        inputs: String,
        #[arg(long, help = "Use the EVM encoding")]
        evm: bool,
    },

    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(short, long, value_name = "FILE", help = "Proof bundle JSON")]
    pub bundle: PathBuf,
    #[arg(long, help = "Expected relying-party domain")]
    pub domain: Option<String>,
    #[arg(long, help = "Expected scope")]
    pub scope: Option<String>,
    #[arg(long, help = "Accept mock documents")]
    pub dev_mode: bool,
    #[arg(long, value_name = "SECONDS", help = "Maximum proof age")]
    pub validity: Option<i64>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RegistryKind {
    Certificate,
    Circuit,
}

#[derive(Subcommand)]
pub enum RegistryAction {
    #[command(about = "Show the latest root")]
    Root {
        #[arg(long, default_value = "certificate")]
        registry: RegistryKind,
    },
    #[command(about = "Show details of a root (latest when omitted)")]
    Details {
        #[arg(long, default_value = "certificate")]
        registry: RegistryKind,
        #[arg(long, value_name = "ROOT", help = "Root as 0x-prefixed hex")]
        root: Option<String>,
    },
    #[command(about = "List historical roots")]
    History {
        #[arg(long, default_value = "certificate")]
        registry: RegistryKind,
        #[arg(long, default_value = "100", help = "Roots per RPC page")]
        page_size: u64,
    },
    #[command(about = "Show the registry contract address")]
    Address {
        #[arg(long, default_value = "certificate")]
        registry: RegistryKind,
    },
}

#[derive(Subcommand)]
pub enum CertsAction {
    #[command(about = "Check a packaged certificates file against a root")]
    Validate {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "ROOT", help = "Expected root (latest on-chain root when omitted)")]
        root: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CircuitsAction {
    #[command(about = "Check a circuit manifest against a root")]
    ValidateManifest {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "ROOT", help = "Expected root (manifest's own root when omitted)")]
        root: Option<String>,
    },
    #[command(about = "Check a packaged circuit's verification key hash")]
    ValidatePackaged {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "HASH", help = "Expected packaged circuit hash")]
        hash: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Show the effective configuration")]
    Show,
    #[command(about = "Write a default configuration file")]
    Init {
        #[arg(short, long, help = "Overwrite existing configuration")]
        force: bool,
        #[arg(long, value_name = "CHAIN_ID", help = "Chain to configure (default sepolia)")]
        chain: Option<u64>,
    },
    #[command(about = "Print the configuration file path")]
    Path,
}
