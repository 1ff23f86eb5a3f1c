//! Relay engine parameters.

use std::time::Duration;

use alloy::primitives::Address;
use updater_core::RoundNumber;

use crate::error::{UpdaterError, UpdaterResult};

/// Parameters of one relay between a beacon chain and an oracle.
#[derive(Debug, Clone)]
pub struct UpdaterParams {
    /// Oracle contract address.
    pub oracle_address: Address,
    /// Chain id of the oracle's network.
    pub chain_id: u64,
    /// Gas limit of each `setRandomness` transaction.
    pub set_randomness_gas_limit: u64,
    /// First round ever written to a fresh oracle.
    pub genesis_round: RoundNumber,
    /// Attempts per round before the service fails.
    pub max_retries: u32,
    /// Delay before the second attempt; doubles for each further attempt.
    pub retry_base_delay: Duration,
    /// Interval between balance checks.
    pub balance_interval: Duration,
    /// Bound on every bootstrap fetch.
    pub bootstrap_timeout: Duration,
    /// Bound on waiting for a receipt (None waits indefinitely).
    pub confirmation_timeout: Option<Duration>,
}

impl Default for UpdaterParams {
    fn default() -> Self {
        Self {
            oracle_address: Address::ZERO,
            chain_id: 1,
            set_randomness_gas_limit: 500_000,
            genesis_round: 1,
            max_retries: 5,
            retry_base_delay: Duration::from_secs(1),
            balance_interval: Duration::from_secs(60),
            bootstrap_timeout: Duration::from_secs(10),
            confirmation_timeout: Some(Duration::from_secs(300)),
        }
    }
}

impl UpdaterParams {
    /// Validate parameter ranges.
    pub fn validate(&self) -> UpdaterResult<()> {
        if self.max_retries == 0 {
            return Err(UpdaterError::InvalidConfig(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.genesis_round == 0 {
            return Err(UpdaterError::InvalidConfig(
                "genesis_round must be at least 1".to_string(),
            ));
        }
        if self.set_randomness_gas_limit == 0 {
            return Err(UpdaterError::InvalidConfig(
                "set_randomness_gas_limit must be positive".to_string(),
            ));
        }
        if self.balance_interval.is_zero() {
            return Err(UpdaterError::InvalidConfig(
                "balance_interval must be positive".to_string(),
            ));
        }
        if self.bootstrap_timeout.is_zero() {
            return Err(UpdaterError::InvalidConfig(
                "bootstrap_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Backoff after failed attempt `attempt` (0-based): `base * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.retry_base_delay.saturating_mul(factor)
    }
}
