//! Task supervisor.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use updater_beacon::DynBeaconSource;
use updater_chain::{DynAuthSigner, DynChainRpc, DynOracleContract, Sender};
use updater_core::RoundNumber;
use updater_telemetry::RelayMetrics;

use crate::backfill::Backfill;
use crate::balance::BalanceMonitor;
use crate::bootstrap::{bootstrap, BootstrapReport};
use crate::config::UpdaterParams;
use crate::error::{UpdaterError, UpdaterResult};
use crate::processor::RoundProcessor;
use crate::queue::round_queue;
use crate::state::SharedState;
use crate::watch::LiveFeed;

/// External collaborators of the relay.
#[derive(Clone)]
pub struct Collaborators {
    pub beacon: DynBeaconSource,
    pub oracle: DynOracleContract,
    pub rpc: DynChainRpc,
    pub signer: DynAuthSigner,
    pub sender: Sender,
    pub metrics: Arc<RelayMetrics>,
}

/// Relays beacon rounds into the oracle contract.
pub struct Updater {
    params: UpdaterParams,
    collaborators: Collaborators,
    state: Arc<SharedState>,
}

impl Updater {
    /// Create an updater with fresh cursors.
    ///
    /// # Errors
    /// `InvalidConfig` if `params` fail validation.
    pub fn new(params: UpdaterParams, collaborators: Collaborators) -> UpdaterResult<Self> {
        Self::with_state(params, collaborators, Arc::new(SharedState::default()))
    }

    /// Create an updater around injected cursors.
    pub fn with_state(
        params: UpdaterParams,
        collaborators: Collaborators,
        state: Arc<SharedState>,
    ) -> UpdaterResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            collaborators,
            state,
        })
    }

    /// Latest round confirmed on-chain by this updater.
    ///
    /// Waits while a round is being processed.
    pub async fn latest_oracle_round(&self) -> RoundNumber {
        self.state.oracle.get().await
    }

    /// Latest beacon round seen.
    pub fn latest_beacon_round(&self) -> RoundNumber {
        self.state.beacon.get()
    }

    /// Shared cursors.
    pub fn state(&self) -> Arc<SharedState> {
        self.state.clone()
    }

    /// Bootstrap, then run every driver until cancellation or the first failure.
    ///
    /// # Errors
    /// The bootstrap error, or the first error raised by a driver.
    pub async fn run(&self, cancel: CancellationToken) -> UpdaterResult<()> {
        let c = &self.collaborators;
        let report = tokio::select! {
            () = cancel.cancelled() => return Ok(()),
            report = bootstrap(
                c.beacon.as_ref(),
                c.oracle.as_ref(),
                &self.state,
                self.params.bootstrap_timeout,
            ) => report?,
        };
        self.publish_bootstrap(&report);

        let scope = cancel.child_token();
        let (queue_tx, queue_rx) = round_queue();
        let mut tasks: JoinSet<(&'static str, UpdaterResult<()>)> = JoinSet::new();

        let processor = RoundProcessor::new(
            self.params.clone(),
            report.chain_info,
            self.state.clone(),
            c,
        );
        let token = scope.clone();
        tasks.spawn(async move { ("processor", processor.run(queue_rx, token).await) });

        let backfill = Backfill::new(c.beacon.clone(), self.state.clone(), self.params.genesis_round);
        let (tx, token) = (queue_tx.clone(), scope.clone());
        tasks.spawn(async move { ("backfill", backfill.run(tx, token).await) });

        let live = LiveFeed::new(c.beacon.clone(), self.state.clone(), c.metrics.clone());
        let token = scope.clone();
        tasks.spawn(async move { ("live feed", live.run(queue_tx, token).await) });

        let monitor = BalanceMonitor::new(
            c.rpc.clone(),
            c.sender.address(),
            c.metrics.clone(),
            self.params.balance_interval,
        );
        let token = scope.clone();
        tasks.spawn(async move {
            monitor.run(token).await;
            ("balance monitor", Ok(()))
        });

        info!(
            sender = %c.sender.address(),
            oracle = %self.params.oracle_address,
            chain_id = self.params.chain_id,
            "Updater started"
        );

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let (driver, result) = match joined {
                Ok(finished) => finished,
                Err(e) => ("unknown", Err(UpdaterError::Task(e.to_string()))),
            };
            match result {
                Ok(()) => debug!(driver, "Driver finished"),
                Err(e) if first_error.is_none() => {
                    error!(driver, error = %e, "Driver failed, stopping updater");
                    scope.cancel();
                    first_error = Some(e);
                }
                Err(e) => debug!(driver, error = %e, "Driver failed during shutdown"),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("Updater stopped");
                Ok(())
            }
        }
    }

    fn publish_bootstrap(&self, report: &BootstrapReport) {
        let metrics = &self.collaborators.metrics;
        metrics.set_drand_info(&report.chain_info);
        metrics.set_drand_round(report.latest_beacon_round);
        metrics.set_oracle_round(report.latest_oracle_round);
    }
}
