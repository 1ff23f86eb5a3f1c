//! Beacon source trait.
//!
//! Abstracts the randomness beacon so the relay engine can be driven by the
//! drand HTTP API in production and by scripted sources in tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use updater_core::{ChainInfo, RoundNumber, RoundRecord};

use crate::error::BeaconResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Round number that asks the beacon for its latest round.
pub const LATEST_ROUND: RoundNumber = 0;

/// Source of beacon rounds.
pub trait BeaconSource: Send + Sync {
    /// Fetch the chain metadata (genesis, period, hash).
    fn info(&self) -> BoxFuture<'_, BeaconResult<ChainInfo>>;

    /// Fetch a specific round, or the latest one for `LATEST_ROUND`.
    ///
    /// Fails if the beacon is unreachable or the round is unknown.
    fn get(&self, round: RoundNumber) -> BoxFuture<'_, BeaconResult<RoundRecord>>;

    /// Subscribe to newly published rounds.
    ///
    /// The returned channel yields rounds in increasing order and is closed
    /// when `cancel` fires or the feed ends.
    fn watch(&self, cancel: CancellationToken) -> mpsc::Receiver<RoundRecord>;
}

/// Arc wrapper for BeaconSource trait objects.
pub type DynBeaconSource = Arc<dyn BeaconSource>;
