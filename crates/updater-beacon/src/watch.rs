//! Polling round watcher.
//!
//! drand publishes one round per period at deterministic times derived from
//! the chain info. The watcher sleeps until the next round boundary, polls the
//! latest round and forwards every round it has not emitted yet, fetching any
//! skipped intermediate rounds so the feed stays gap-free.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use updater_core::{ChainInfo, RoundNumber, RoundRecord};

use crate::error::BeaconResult;
use crate::source::{DynBeaconSource, LATEST_ROUND};

/// Grace period after a round boundary before polling, so the relay has the round.
const PUBLISH_GRACE: Duration = Duration::from_millis(250);

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollOutcome {
    /// New rounds were forwarded.
    Advanced,
    /// The beacon has not published a new round yet.
    Pending,
    /// The consumer is gone or shutdown was requested.
    Stopped,
}

/// Feeds newly published rounds into a channel.
pub struct PollingWatcher {
    source: DynBeaconSource,
    tx: mpsc::Sender<RoundRecord>,
    retry_delay: Duration,
    last_emitted: Option<RoundNumber>,
}

impl PollingWatcher {
    /// Create a watcher forwarding into `tx`.
    pub fn new(
        source: DynBeaconSource,
        tx: mpsc::Sender<RoundRecord>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            source,
            tx,
            retry_delay,
            last_emitted: None,
        }
    }

    /// Run until cancelled or the receiver is dropped.
    ///
    /// The channel is closed when this returns.
    pub async fn run(mut self, cancel: CancellationToken) {
        let info = match self.load_info(&cancel).await {
            Some(info) => info,
            None => return,
        };

        info!(
            period_secs = info.period_secs(),
            genesis_time = info.genesis_time,
            "drand watch started"
        );

        let mut wait = Duration::ZERO;
        loop {
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = cancel.cancelled() => {
                    debug!("drand watch cancelled");
                    return;
                }
            }

            wait = match self.poll(&cancel).await {
                Ok(PollOutcome::Advanced) => until_next_round(&info),
                Ok(PollOutcome::Pending) => self.retry_delay,
                Ok(PollOutcome::Stopped) => {
                    debug!("drand watch stopped");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "drand watch poll failed, retrying");
                    self.retry_delay
                }
            };
        }
    }

    /// Fetch chain info, retrying until it succeeds or shutdown is requested.
    async fn load_info(&self, cancel: &CancellationToken) -> Option<ChainInfo> {
        loop {
            let result = tokio::select! {
                result = self.source.info() => result,
                () = cancel.cancelled() => return None,
            };
            match result {
                Ok(info) => return Some(info),
                Err(e) => warn!(error = %e, "Failed to fetch drand info for watch, retrying"),
            }
            tokio::select! {
                () = tokio::time::sleep(self.retry_delay) => {}
                () = cancel.cancelled() => return None,
            }
        }
    }

    /// Poll the latest round and forward everything not yet emitted.
    async fn poll(&mut self, cancel: &CancellationToken) -> BeaconResult<PollOutcome> {
        let Some(latest) = self.fetch(LATEST_ROUND, cancel).await else {
            return Ok(PollOutcome::Stopped);
        };
        let latest = latest?;

        let first = match self.last_emitted {
            Some(last) if latest.round <= last => return Ok(PollOutcome::Pending),
            Some(last) => last + 1,
            None => latest.round,
        };

        for round in first..latest.round {
            debug!(round, latest = latest.round, "Filling skipped drand round");
            let Some(record) = self.fetch(round, cancel).await else {
                return Ok(PollOutcome::Stopped);
            };
            if !self.emit(record?, cancel).await {
                return Ok(PollOutcome::Stopped);
            }
        }

        if !self.emit(latest, cancel).await {
            return Ok(PollOutcome::Stopped);
        }
        Ok(PollOutcome::Advanced)
    }

    /// Fetch one round; `None` if shutdown was requested first.
    async fn fetch(
        &self,
        round: RoundNumber,
        cancel: &CancellationToken,
    ) -> Option<BeaconResult<RoundRecord>> {
        tokio::select! {
            result = self.source.get(round) => Some(result),
            () = cancel.cancelled() => None,
        }
    }

    /// Forward one round. Returns false if the watch should stop.
    async fn emit(&mut self, record: RoundRecord, cancel: &CancellationToken) -> bool {
        let round = record.round;
        tokio::select! {
            sent = self.tx.send(record) => {
                if sent.is_err() {
                    return false;
                }
                self.last_emitted = Some(round);
                true
            }
            () = cancel.cancelled() => false,
        }
    }
}

/// Time left until the next round is expected to be available.
fn until_next_round(info: &ChainInfo) -> Duration {
    let now_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
    let (_, next_at) = info.next_round(now_ms / 1000);
    let next_at_ms = next_at.saturating_mul(1000);
    Duration::from_millis(next_at_ms.saturating_sub(now_ms)) + PUBLISH_GRACE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BeaconError;
    use crate::source::{BeaconSource, BoxFuture};
    use alloy::primitives::B256;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Source whose latest round follows a script; other rounds are synthesized.
    struct ScriptedSource {
        latest: Mutex<VecDeque<BeaconResult<RoundNumber>>>,
        fetched: Mutex<Vec<RoundNumber>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<BeaconResult<RoundNumber>>) -> Arc<Self> {
            Arc::new(Self {
                latest: Mutex::new(script.into()),
                fetched: Mutex::new(Vec::new()),
            })
        }
    }

    fn record(round: RoundNumber) -> RoundRecord {
        RoundRecord::new(round, B256::with_last_byte(round as u8), vec![round as u8])
    }

    impl BeaconSource for ScriptedSource {
        fn info(&self) -> BoxFuture<'_, BeaconResult<ChainInfo>> {
            Box::pin(async {
                Ok(ChainInfo::new(1, Duration::from_secs(3), B256::ZERO).unwrap())
            })
        }

        fn get(&self, round: RoundNumber) -> BoxFuture<'_, BeaconResult<RoundRecord>> {
            Box::pin(async move {
                if round != LATEST_ROUND {
                    self.fetched.lock().push(round);
                    return Ok(record(round));
                }
                // Once the script is exhausted the beacon stops advancing.
                let mut latest = self.latest.lock();
                let next = if latest.len() > 1 {
                    latest.pop_front()
                } else {
                    latest.front().map(|r| match r {
                        Ok(round) => Ok(*round),
                        Err(_) => Err(BeaconError::NoEndpoints),
                    })
                };
                next.unwrap_or(Err(BeaconError::NoEndpoints)).map(record)
            })
        }

        fn watch(&self, _cancel: CancellationToken) -> mpsc::Receiver<RoundRecord> {
            mpsc::channel(1).1
        }
    }

    async fn collect(rx: &mut mpsc::Receiver<RoundRecord>, n: usize) -> Vec<RoundNumber> {
        let mut rounds = Vec::new();
        for _ in 0..n {
            rounds.push(rx.recv().await.unwrap().round);
        }
        rounds
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_emits_latest_then_new_rounds() {
        let source = ScriptedSource::new(vec![Ok(10), Ok(10), Ok(11), Ok(12)]);
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let watcher = PollingWatcher::new(source, tx, Duration::from_millis(100));
        let handle = tokio::spawn(watcher.run(cancel.clone()));

        assert_eq!(collect(&mut rx, 3).await, vec![10, 11, 12]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_fills_gaps() {
        let source = ScriptedSource::new(vec![Ok(10), Ok(14)]);
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let watcher = PollingWatcher::new(source.clone(), tx, Duration::from_millis(100));
        let handle = tokio::spawn(watcher.run(cancel.clone()));

        assert_eq!(collect(&mut rx, 5).await, vec![10, 11, 12, 13, 14]);
        assert_eq!(*source.fetched.lock(), vec![11, 12, 13]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_survives_poll_errors() {
        let source = ScriptedSource::new(vec![Ok(5), Err(BeaconError::NoEndpoints), Ok(6)]);
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let watcher = PollingWatcher::new(source, tx, Duration::from_millis(100));
        let handle = tokio::spawn(watcher.run(cancel.clone()));

        assert_eq!(collect(&mut rx, 2).await, vec![5, 6]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_closes_channel_on_cancel() {
        let source = ScriptedSource::new(vec![Ok(1)]);
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let watcher = PollingWatcher::new(source, tx, Duration::from_millis(100));
        let handle = tokio::spawn(watcher.run(cancel.clone()));

        assert_eq!(rx.recv().await.unwrap().round, 1);
        cancel.cancel();
        handle.await.unwrap();

        assert!(rx.recv().await.is_none());
    }

    /// Source whose requests never complete once the flagged call is reached.
    struct StalledSource {
        stall_info: bool,
    }

    impl BeaconSource for StalledSource {
        fn info(&self) -> BoxFuture<'_, BeaconResult<ChainInfo>> {
            Box::pin(async move {
                if self.stall_info {
                    std::future::pending::<()>().await;
                }
                Ok(ChainInfo::new(1, Duration::from_secs(3), B256::ZERO).unwrap())
            })
        }

        fn get(&self, _round: RoundNumber) -> BoxFuture<'_, BeaconResult<RoundRecord>> {
            Box::pin(std::future::pending::<BeaconResult<RoundRecord>>())
        }

        fn watch(&self, _cancel: CancellationToken) -> mpsc::Receiver<RoundRecord> {
            mpsc::channel(1).1
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_stalled_info_request() {
        let source = Arc::new(StalledSource { stall_info: true });
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let watcher = PollingWatcher::new(source, tx, Duration::from_millis(100));
        let handle = tokio::spawn(watcher.run(cancel.clone()));

        tokio::task::yield_now().await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher should stop on cancel")
            .unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_stalled_round_request() {
        let source = Arc::new(StalledSource { stall_info: false });
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let watcher = PollingWatcher::new(source, tx, Duration::from_millis(100));
        let handle = tokio::spawn(watcher.run(cancel.clone()));

        tokio::task::yield_now().await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher should stop on cancel")
            .unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_until_next_round_is_bounded_by_period() {
        let info = ChainInfo::new(1, Duration::from_secs(3), B256::ZERO).unwrap();
        let wait = until_next_round(&info);
        assert!(wait <= Duration::from_secs(3) + PUBLISH_GRACE);
    }
}
