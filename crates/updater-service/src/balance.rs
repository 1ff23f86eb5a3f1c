//! Balance monitor: periodic health check of the paying account.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use updater_chain::DynChainRpc;
use updater_telemetry::RelayMetrics;

/// Polls the updater balance into the metrics sink.
///
/// Failures are logged and the loop carries on. The monitor never touches
/// the cursors and never fails the service.
pub struct BalanceMonitor {
    rpc: DynChainRpc,
    address: Address,
    metrics: Arc<RelayMetrics>,
    interval: Duration,
}

impl BalanceMonitor {
    pub fn new(
        rpc: DynChainRpc,
        address: Address,
        metrics: Arc<RelayMetrics>,
        interval: Duration,
    ) -> Self {
        Self {
            rpc,
            address,
            metrics,
            interval,
        }
    }

    /// Run until `cancel` fires. The first check happens one interval in.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let balance = tokio::select! {
                () = cancel.cancelled() => return,
                result = self.rpc.balance_at(self.address) => result,
            };
            match balance {
                Ok(balance) => {
                    self.metrics.set_balance_wei(wei_to_f64(balance));
                    debug!(address = %self.address, %balance, "Updated balance metric");
                }
                Err(e) => {
                    error!(address = %self.address, error = %e, "Failed to get updater balance");
                }
            }
        }
    }
}

fn wei_to_f64(wei: U256) -> f64 {
    u128::try_from(wei).map(|v| v as f64).unwrap_or(f64::MAX)
}
