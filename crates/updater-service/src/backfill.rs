//! Backfill driver: walks the rounds the oracle is missing into the queue.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use updater_beacon::DynBeaconSource;
use updater_core::RoundNumber;

use crate::error::UpdaterResult;
use crate::queue::{PushOutcome, RoundSender};
use crate::state::SharedState;

/// Catch-up driver.
///
/// Each pass snapshots both cursors and pushes every round from the oracle's
/// successor (or the genesis round for a fresh oracle) through the beacon
/// snapshot. Rounds already committed by the time they reach the processor
/// are skipped there, so re-pushing on a later pass is harmless.
pub struct Backfill {
    beacon: DynBeaconSource,
    state: Arc<SharedState>,
    genesis_round: RoundNumber,
}

impl Backfill {
    pub fn new(beacon: DynBeaconSource, state: Arc<SharedState>, genesis_round: RoundNumber) -> Self {
        Self {
            beacon,
            state,
            genesis_round,
        }
    }

    /// First round to push given the oracle's latest round.
    fn start_round(&self, latest_oracle: RoundNumber) -> RoundNumber {
        if latest_oracle == 0 {
            self.genesis_round
        } else {
            latest_oracle + 1
        }
    }

    /// Run until the oracle has caught up with the beacon.
    ///
    /// # Errors
    /// A beacon fetch failure is returned as is and ends the driver.
    pub async fn run(self, queue: RoundSender, cancel: CancellationToken) -> UpdaterResult<()> {
        loop {
            let latest_beacon = self.state.beacon.get();
            let latest_oracle = tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                round = self.state.oracle.get() => round,
            };

            if latest_oracle >= latest_beacon {
                info!(latest_oracle, latest_beacon, "Caught up, backfill finished");
                return Ok(());
            }

            let mut current = self.start_round(latest_oracle);
            if current > latest_beacon {
                info!(
                    start = current,
                    latest_beacon,
                    "Nothing to backfill before the live feed, backfill finished"
                );
                return Ok(());
            }

            debug!(from = current, to = latest_beacon, "Backfilling rounds");
            while current <= latest_beacon {
                let record = tokio::select! {
                    () = cancel.cancelled() => return Ok(()),
                    result = self.beacon.get(current) => result.map_err(|e| {
                        error!(round = current, error = %e, "Failed to get round from drand");
                        e
                    })?,
                };

                match queue.push(record, &cancel).await {
                    PushOutcome::Delivered => current += 1,
                    PushOutcome::Cancelled | PushOutcome::Closed => return Ok(()),
                }
            }
        }
    }
}
