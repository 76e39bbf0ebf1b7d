mod app;
mod logging;

pub use app::{AppConfig, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use logging::{LogLevel, LoggingConfig};
