use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

const CONFIG_DIR: &str = "sidctl";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:7545";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xd99F05A7Db6b2C8dAddd2Cf1B3C74cac6E9bf979";
pub const DEFAULT_GAS_LIMIT: u64 = 1_500_000;
/// 30 gwei
pub const DEFAULT_GAS_PRICE: u64 = 30_000_000_000;
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;

/// Connection and gas policy handed to the client at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub contract_address: String,
    pub gas_limit: u64,
    /// In wei
    pub gas_price: u64,
    pub receipt_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn contract_address(&self) -> Result<Address> {
        self.contract_address.parse().map_err(|e| {
            ClientError::configuration(
                "contract_address",
                format!("'{}' is not an address: {}", self.contract_address, e),
            )
        })
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }
}

/// Paths of the compiled contract artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub abi: PathBuf,
    pub bytecode: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            abi: PathBuf::from("SID_ABI.json"),
            bytecode: PathBuf::from("SID_Bytecode.bin"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub artifacts: ArtifactPaths,

    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", config_path);
            Ok(Self {
                config_path: Some(config_path),
                ..Default::default()
            })
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ClientError::configuration(path, format!("Failed to read config file: {}", e))
        })?;

        let mut config: AppConfig = toml::from_str(&content).map_err(|e| {
            ClientError::configuration(path, format!("Failed to parse config file: {}", e))
        })?;

        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Write the configuration back to where it was loaded from
    pub fn save(&self) -> Result<PathBuf> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::configuration(parent, format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            ClientError::configuration(&path, format!("Failed to serialize config: {}", e))
        })?;

        fs::write(&path, content).map_err(|e| {
            ClientError::configuration(&path, format!("Failed to write config file: {}", e))
        })?;

        Ok(path)
    }

    fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ClientError::configuration(CONFIG_DIR, "Could not determine config directory")
        })?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}
