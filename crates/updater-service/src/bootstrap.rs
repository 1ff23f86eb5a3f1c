//! Startup validation and cursor initialization.
//!
//! Runs once before any driver. The chain hash check comes first so a
//! misconfigured deployment is rejected before anything else is read.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info};
use updater_beacon::{BeaconSource, LATEST_ROUND};
use updater_chain::OracleContract;
use updater_core::{ChainInfo, RoundNumber};

use crate::error::{UpdaterError, UpdaterResult};
use crate::state::SharedState;

/// What bootstrap learned about both chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub chain_info: ChainInfo,
    pub earliest_oracle_round: RoundNumber,
    pub latest_oracle_round: RoundNumber,
    pub latest_beacon_round: RoundNumber,
}

/// Validate the trust anchor and seed both cursors.
///
/// # Errors
/// - `ChainHashMismatch` if the oracle and the beacon disagree on the chain
/// - `Timeout` if any fetch exceeds `timeout`
/// - `Beacon` / `Chain` on transport failures
pub async fn bootstrap(
    beacon: &dyn BeaconSource,
    oracle: &dyn OracleContract,
    state: &SharedState,
    timeout: Duration,
) -> UpdaterResult<BootstrapReport> {
    let chain_info = bounded("drand info", timeout, beacon.info()).await?;
    let oracle_hash = bounded("oracle chain hash", timeout, oracle.chain_hash()).await?;
    if oracle_hash != chain_info.hash {
        error!(
            oracle = %oracle_hash,
            beacon = %chain_info.hash,
            "Chain hash mismatch, refusing to start"
        );
        return Err(UpdaterError::ChainHashMismatch {
            oracle: oracle_hash,
            beacon: chain_info.hash,
        });
    }

    let earliest_oracle_round =
        bounded("oracle earliest round", timeout, oracle.earliest_round()).await?;
    let latest_oracle_round =
        bounded("oracle latest round", timeout, oracle.latest_round()).await?;
    *state.oracle.lock().await = latest_oracle_round;
    info!(
        earliest = earliest_oracle_round,
        latest = latest_oracle_round,
        "Oracle rounds"
    );

    let latest = bounded("drand latest round", timeout, beacon.get(LATEST_ROUND)).await?;
    state.beacon.set(latest.round);
    info!(latest = latest.round, period_secs = chain_info.period_secs(), "Drand rounds");

    Ok(BootstrapReport {
        chain_info,
        earliest_oracle_round,
        latest_oracle_round,
        latest_beacon_round: latest.round,
    })
}

async fn bounded<T, E>(
    operation: &'static str,
    timeout: Duration,
    fut: impl Future<Output = Result<T, E>>,
) -> UpdaterResult<T>
where
    UpdaterError: From<E>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(|e| {
            let e = UpdaterError::from(e);
            error!(operation, error = %e, "Bootstrap fetch failed");
            e
        }),
        Err(_) => {
            error!(operation, ?timeout, "Bootstrap fetch timed out");
            Err(UpdaterError::Timeout { operation, timeout })
        }
    }
}
