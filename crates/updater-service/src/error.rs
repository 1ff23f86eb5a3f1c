//! Relay engine error types.

use std::time::Duration;

use alloy::primitives::{TxHash, B256};
use thiserror::Error;
use updater_beacon::BeaconError;
use updater_chain::ChainError;
use updater_core::RoundNumber;

#[derive(Debug, Error)]
pub enum UpdaterError {
    /// The oracle was deployed for a different beacon chain.
    #[error("Chain hash mismatch: oracle expects {oracle}, beacon serves {beacon}")]
    ChainHashMismatch { oracle: B256, beacon: B256 },

    #[error("Beacon error: {0}")]
    Beacon(#[from] BeaconError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// Mined with a failed receipt status.
    #[error("setRandomness for round {round} reverted in transaction {tx_hash}")]
    TransactionFailed { round: RoundNumber, tx_hash: TxHash },

    #[error("Round {round} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        round: RoundNumber,
        attempts: u32,
        #[source]
        source: Box<UpdaterError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Task failed: {0}")]
    Task(String),
}

impl UpdaterError {
    /// Whether this error aborts startup without ever running a driver.
    pub fn is_trust_anchor_failure(&self) -> bool {
        matches!(self, Self::ChainHashMismatch { .. })
    }
}

pub type UpdaterResult<T> = Result<T, UpdaterError>;
