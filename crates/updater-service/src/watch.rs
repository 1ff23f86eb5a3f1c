//! Live feed driver: forwards newly published rounds into the queue.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use updater_beacon::DynBeaconSource;
use updater_telemetry::RelayMetrics;

use crate::error::UpdaterResult;
use crate::queue::{PushOutcome, RoundSender};
use crate::state::SharedState;

/// Subscribes to the beacon feed for the lifetime of the service.
pub struct LiveFeed {
    beacon: DynBeaconSource,
    state: Arc<SharedState>,
    metrics: Arc<RelayMetrics>,
}

impl LiveFeed {
    pub fn new(beacon: DynBeaconSource, state: Arc<SharedState>, metrics: Arc<RelayMetrics>) -> Self {
        Self {
            beacon,
            state,
            metrics,
        }
    }

    /// Forward rounds until the feed closes or `cancel` fires.
    pub async fn run(self, queue: RoundSender, cancel: CancellationToken) -> UpdaterResult<()> {
        let mut feed = self.beacon.watch(cancel.child_token());
        info!("Watching for new drand rounds");

        loop {
            let record = tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Live feed cancelled");
                    return Ok(());
                }
                next = feed.recv() => match next {
                    Some(record) => record,
                    None => {
                        warn!("drand feed closed, live feed finished");
                        return Ok(());
                    }
                },
            };

            let latest = self.state.beacon.advance(record.round);
            self.metrics.set_drand_round(latest);
            debug!(round = record.round, "New drand round");

            match queue.push(record, &cancel).await {
                PushOutcome::Delivered => {}
                PushOutcome::Cancelled | PushOutcome::Closed => return Ok(()),
            }
        }
    }
}
