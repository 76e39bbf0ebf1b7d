mod commands;
mod commitment;
mod config_cmd;
mod registry;
mod snapshots;
mod utils;
mod verify;

pub use commands::*;
pub use commitment::handle_commitment;
pub use config_cmd::handle_config;
pub use registry::handle_registry;
pub use snapshots::{handle_certs, handle_circuits};
pub use utils::init_logging;
pub use verify::handle_verify;
