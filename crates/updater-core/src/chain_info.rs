//! Beacon chain metadata.
//!
//! Fetched once at startup and never mutated afterwards. The chain hash is the
//! trust anchor compared against the hash the oracle contract was deployed
//! with; genesis time and period map round numbers to wall-clock time.

use std::time::Duration;

use alloy::primitives::B256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::round::RoundNumber;

/// Immutable beacon chain information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Unix time (seconds) of round 1.
    pub genesis_time: u64,
    /// Time between consecutive rounds.
    pub period: Duration,
    /// Chain-identifying hash.
    pub hash: B256,
}

impl ChainInfo {
    /// Create chain info, rejecting a zero period.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidChainInfo` if `period` is shorter than one second.
    pub fn new(genesis_time: u64, period: Duration, hash: B256) -> Result<Self> {
        if period.as_secs() == 0 {
            return Err(CoreError::InvalidChainInfo(format!(
                "period must be at least 1s, got {period:?}"
            )));
        }
        Ok(Self {
            genesis_time,
            period,
            hash,
        })
    }

    /// Period in whole seconds.
    #[must_use]
    pub fn period_secs(&self) -> u64 {
        self.period.as_secs()
    }

    /// Unix timestamp at which `round` was published.
    ///
    /// `genesis_time + (round - 1) * period`. Round 0 maps to genesis.
    #[must_use]
    pub fn round_timestamp(&self, round: RoundNumber) -> u64 {
        self.genesis_time
            .saturating_add(round.saturating_sub(1).saturating_mul(self.period_secs()))
    }

    /// Round timestamp as a UTC datetime (for logging).
    #[must_use]
    pub fn round_datetime(&self, round: RoundNumber) -> Option<DateTime<Utc>> {
        i64::try_from(self.round_timestamp(round))
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Round that is current at unix time `now`. Zero before genesis.
    #[must_use]
    pub fn round_at(&self, now: u64) -> RoundNumber {
        if now < self.genesis_time {
            return 0;
        }
        (now - self.genesis_time) / self.period_secs() + 1
    }

    /// The round published after `now` and its publication time.
    #[must_use]
    pub fn next_round(&self, now: u64) -> (RoundNumber, u64) {
        let next = self.round_at(now) + 1;
        (next, self.round_timestamp(next))
    }
}
