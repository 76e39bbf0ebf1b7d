#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod bundle;
pub mod config;

pub use bundle::VerificationBundle;
pub use config::{AppConfig, LogLevel, LoggingConfig};
