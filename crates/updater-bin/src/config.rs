//! Application configuration.
//!
//! Loaded from a TOML file. Private keys are never stored in the file; the
//! `keys` section only says where to load them from.

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use updater_beacon::BeaconConfig;
use updater_chain::{KeySource, OracleClientConfig};
use updater_service::UpdaterParams;

use crate::error::{AppError, AppResult};

/// drand beacon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrandConfig {
    /// Relay base URLs, tried in order.
    #[serde(default = "default_drand_urls")]
    pub urls: Vec<String>,
    /// Hex chain hash selecting the beacon chain on multi-chain relays.
    #[serde(default)]
    pub chain_hash: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Delay before re-polling a late round or after a failed poll.
    #[serde(default = "default_watch_retry_ms")]
    pub watch_retry_ms: u64,
}

fn default_drand_urls() -> Vec<String> {
    vec!["https://api.drand.sh".to_string()]
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_watch_retry_ms() -> u64 {
    500
}

impl Default for DrandConfig {
    fn default() -> Self {
        Self {
            urls: default_drand_urls(),
            chain_hash: None,
            request_timeout_ms: default_request_timeout_ms(),
            watch_retry_ms: default_watch_retry_ms(),
        }
    }
}

/// EVM chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Oracle contract address (hex).
    pub oracle_address: String,
    #[serde(default = "default_gas_limit")]
    pub set_randomness_gas_limit: u64,
    /// Receipt wait bound in seconds. 0 waits indefinitely.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
}

fn default_gas_limit() -> u64 {
    500_000
}

fn default_confirmation_timeout_secs() -> u64 {
    300
}

fn default_receipt_poll_ms() -> u64 {
    1_000
}

/// Relay engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// First round written to a fresh oracle.
    #[serde(default = "default_genesis_round")]
    pub genesis_round: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the second attempt of a round; doubles afterwards.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_balance_interval_secs")]
    pub balance_interval_secs: u64,
    #[serde(default = "default_bootstrap_timeout_secs")]
    pub bootstrap_timeout_secs: u64,
}

fn default_genesis_round() -> u64 {
    1
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    1_000
}

fn default_balance_interval_secs() -> u64 {
    60
}

fn default_bootstrap_timeout_secs() -> u64 {
    10
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            genesis_round: default_genesis_round(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            balance_interval_secs: default_balance_interval_secs(),
            bootstrap_timeout_secs: default_bootstrap_timeout_secs(),
        }
    }
}

/// Key sources for the authorization signer and the paying sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    pub signer: KeySource,
    pub sender: KeySource,
    /// Expected signer address; startup fails if the key does not match.
    #[serde(default)]
    pub signer_address: Option<String>,
    /// Expected sender address; startup fails if the key does not match.
    #[serde(default)]
    pub sender_address: Option<String>,
}

/// Metrics endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_true() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            metrics_port: default_metrics_port(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub drand: DrandConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub updater: UpdaterConfig,
    pub keys: KeysConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints and address formats.
    pub fn validate(&self) -> AppResult<()> {
        if self.drand.urls.is_empty() {
            return Err(AppError::Config("drand.urls must not be empty".to_string()));
        }
        if self.chain.rpc_url.is_empty() {
            return Err(AppError::Config("chain.rpc_url must not be empty".to_string()));
        }
        self.oracle_address()?;
        self.drand_chain_hash()?;
        self.signer_address()?;
        self.sender_address()?;
        self.updater_params()
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn oracle_address(&self) -> AppResult<Address> {
        parse_address("chain.oracle_address", &self.chain.oracle_address)
    }

    pub fn drand_chain_hash(&self) -> AppResult<Option<B256>> {
        self.drand
            .chain_hash
            .as_deref()
            .map(|hash| {
                B256::from_str(hash)
                    .map_err(|e| AppError::Config(format!("drand.chain_hash {hash:?}: {e}")))
            })
            .transpose()
    }

    pub fn signer_address(&self) -> AppResult<Option<Address>> {
        self.keys
            .signer_address
            .as_deref()
            .map(|addr| parse_address("keys.signer_address", addr))
            .transpose()
    }

    pub fn sender_address(&self) -> AppResult<Option<Address>> {
        self.keys
            .sender_address
            .as_deref()
            .map(|addr| parse_address("keys.sender_address", addr))
            .transpose()
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.updater.bootstrap_timeout_secs)
    }

    /// Relay engine parameters.
    ///
    /// An unparsable oracle address maps to zero here; `validate` rejects it first.
    pub fn updater_params(&self) -> UpdaterParams {
        let confirmation_timeout = match self.chain.confirmation_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        UpdaterParams {
            oracle_address: self.oracle_address().unwrap_or_default(),
            chain_id: self.chain.chain_id,
            set_randomness_gas_limit: self.chain.set_randomness_gas_limit,
            genesis_round: self.updater.genesis_round,
            max_retries: self.updater.max_retries,
            retry_base_delay: Duration::from_millis(self.updater.retry_base_delay_ms),
            balance_interval: Duration::from_secs(self.updater.balance_interval_secs),
            bootstrap_timeout: self.bootstrap_timeout(),
            confirmation_timeout,
        }
    }

    pub fn beacon_config(&self) -> AppResult<BeaconConfig> {
        Ok(BeaconConfig {
            urls: self.drand.urls.clone(),
            chain_hash: self.drand_chain_hash()?,
            request_timeout: Duration::from_millis(self.drand.request_timeout_ms),
            watch_retry_delay: Duration::from_millis(self.drand.watch_retry_ms),
        })
    }

    pub fn oracle_client_config(&self) -> AppResult<OracleClientConfig> {
        Ok(OracleClientConfig {
            rpc_url: self.chain.rpc_url.clone(),
            oracle_address: self.oracle_address()?,
            chain_id: self.chain.chain_id,
            receipt_poll_interval: Duration::from_millis(self.chain.receipt_poll_ms),
        })
    }
}

fn parse_address(field: &str, value: &str) -> AppResult<Address> {
    Address::from_str(value).map_err(|e| AppError::Config(format!("{field} {value:?}: {e}")))
}
