use super::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zkid_registry::RegistryConfig;
use zkid_types::{ZkidError, ZkidResult};
use zkid_verifier::VerifierConfig;

pub const CONFIG_DIR_NAME: &str = ".zkid";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub verifier: VerifierConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// `~/.zkid/config.toml`, or a relative path when there is no home directory.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(CONFIG_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME))
            .join(CONFIG_FILE_NAME)
    }

    pub fn load(path: impl AsRef<Path>) -> ZkidResult<Self> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses the file without environment overrides or validation.
    pub fn read(path: impl AsRef<Path>) -> ZkidResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ZkidError::Config(format!("Failed to read config: {}", e)))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> ZkidResult<Self> {
        toml::from_str(contents).map_err(|e| ZkidError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn to_toml(&self) -> ZkidResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ZkidError::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ZkidResult<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ZkidError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path.as_ref(), contents)
            .map_err(|e| ZkidError::Config(format!("Failed to write config: {}", e)))?;

        info!("Configuration saved to {:?}", path.as_ref());
        Ok(())
    }

    pub fn validate(&self) -> ZkidResult<()> {
        self.registry.validate()?;
        self.verifier.validate()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `ZKID_*` overrides. Values that fail to parse are logged and
    /// ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(chain) = parsed::<u64, F>(&lookup, "ZKID_CHAIN_ID") {
            if chain != self.registry.chain_id {
                let mut registry = RegistryConfig::for_chain(chain);
                registry.retry_count = self.registry.retry_count;
                registry.timeout_secs = self.registry.timeout_secs;
                registry.certificates_url = std::mem::take(&mut self.registry.certificates_url);
                registry.circuits_url = std::mem::take(&mut self.registry.circuits_url);
                self.registry = registry;
            }
        }

        if let Some(url) = lookup("ZKID_RPC_URL") {
            self.registry.rpc_url = Some(url);
        }

        if let Some(address) = lookup("ZKID_ROOT_REGISTRY") {
            self.registry.root_registry = Some(address);
        }

        if let Some(address) = lookup("ZKID_REGISTRY_HELPER") {
            self.registry.registry_helper = Some(address);
        }

        if let Some(count) = parsed(&lookup, "ZKID_RETRY_COUNT") {
            self.registry.retry_count = count;
        }

        if let Some(domain) = lookup("ZKID_DOMAIN") {
            self.verifier.domain = Some(domain);
        }

        if let Some(scope) = lookup("ZKID_SCOPE") {
            self.verifier.scope = Some(scope);
        }

        if let Some(dev_mode) = parsed(&lookup, "ZKID_DEV_MODE") {
            if dev_mode {
                warn!("Development mode enabled from environment. Mock documents will be accepted.");
            }
            self.verifier.dev_mode = dev_mode;
        }

        if let Some(level) = parsed(&lookup, "ZKID_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(json) = parsed(&lookup, "ZKID_LOG_JSON") {
            self.logging.json = json;
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: cannot parse {:?}", key, raw);
            None
        }
    }
}
