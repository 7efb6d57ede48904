//! Configuration management for the precursor ledger

use crate::error::{ChainError, Result};
use crate::miner::{PowTarget, ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    #[serde(default)]
    pub pow_target: PowTarget,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            difficulty: default_difficulty(),
            pow_target: PowTarget::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    pub fn proof_of_work(&self) -> ProofOfWork {
        ProofOfWork::new(self.ledger.difficulty, self.ledger.pow_target)
    }

    pub fn api_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.api.host, self.api.port)
            .parse()
            .map_err(|e| ChainError::ConfigError(format!("invalid api address: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.ledger.data_file.is_empty() {
            return Err(ChainError::ConfigError(
                "ledger.data_file must be set in config.toml".to_string(),
            ));
        }
        if self.ledger.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::ConfigError(format!(
                "ledger.difficulty must be at most {}",
                MAX_DIFFICULTY
            )));
        }
        self.api_addr()?;
        Ok(())
    }
}

/// Read a TOML config file. A missing file yields the defaults.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let config = match fs::read_to_string(path.as_ref()) {
        Ok(text) => parse_config(&text)?,
        Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
        Err(e) => return Err(e.into()),
    };
    config.validate()?;
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<Config> {
    toml::from_str(text).map_err(|e| ChainError::ConfigError(e.to_string()))
}

fn default_data_file() -> String {
    "blockchain_data.json".to_string()
}

fn default_difficulty() -> usize {
    DEFAULT_DIFFICULTY
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}
