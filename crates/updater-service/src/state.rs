//! Shared cursors of the relay.
//!
//! Two independently synchronized scalars:
//! - `BeaconCursor`: latest round seen from the beacon. Guarded by a
//!   `parking_lot` mutex that is never held across an await point.
//! - `OracleCursor`: latest round confirmed on-chain. Guarded by an async
//!   mutex that the round processor holds for the whole per-round sequence,
//!   network calls included, which serializes on-chain updates.

use parking_lot::Mutex;
use updater_core::RoundNumber;

/// Latest beacon round known to the relay.
#[derive(Debug, Default)]
pub struct BeaconCursor {
    round: Mutex<RoundNumber>,
}

impl BeaconCursor {
    pub fn new(round: RoundNumber) -> Self {
        Self {
            round: Mutex::new(round),
        }
    }

    pub fn get(&self) -> RoundNumber {
        *self.round.lock()
    }

    pub fn set(&self, round: RoundNumber) {
        *self.round.lock() = round;
    }

    /// Move the cursor forward to `round`; never moves it back.
    pub fn advance(&self, round: RoundNumber) -> RoundNumber {
        let mut current = self.round.lock();
        *current = (*current).max(round);
        *current
    }
}

/// Latest round confirmed by the oracle contract.
#[derive(Debug, Default)]
pub struct OracleCursor {
    round: tokio::sync::Mutex<RoundNumber>,
}

impl OracleCursor {
    pub fn new(round: RoundNumber) -> Self {
        Self {
            round: tokio::sync::Mutex::new(round),
        }
    }

    /// Read the cursor. Waits while a round is being processed.
    pub async fn get(&self) -> RoundNumber {
        *self.round.lock().await
    }

    /// Lock the cursor for the duration of one round.
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, RoundNumber> {
        self.round.lock().await
    }
}

/// Cursors shared by the drivers.
#[derive(Debug, Default)]
pub struct SharedState {
    pub beacon: BeaconCursor,
    pub oracle: OracleCursor,
}

impl SharedState {
    pub fn new(beacon_round: RoundNumber, oracle_round: RoundNumber) -> Self {
        Self {
            beacon: BeaconCursor::new(beacon_round),
            oracle: OracleCursor::new(oracle_round),
        }
    }
}
