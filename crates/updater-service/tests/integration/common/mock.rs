//! Scripted collaborators for relay integration tests.
//!
//! Every mock records the calls it receives behind a `parking_lot::Mutex` so
//! tests can assert on exact call sequences, and exposes knobs to inject
//! failures.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use updater_beacon::{BeaconError, BeaconResult, BeaconSource, BoxFuture};
use updater_chain::{
    AuthSigner, ChainError, ChainResult, ChainRpc, MinedReceipt, OracleContract,
    RandomnessUpdate, SubmitOptions,
};
use updater_core::{ChainInfo, RoundNumber, RoundRecord};

use super::record;

// ============================================================================
// Beacon
// ============================================================================

/// Call received by [`MockBeacon`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeaconCall {
    Info,
    Get(RoundNumber),
    Watch,
}

/// Beacon with a fixed latest round and a test-driven live feed.
pub struct MockBeacon {
    info: ChainInfo,
    latest: Mutex<RoundNumber>,
    calls: Mutex<Vec<BeaconCall>>,
    failing_rounds: Mutex<HashSet<RoundNumber>>,
    hang_info: AtomicBool,
    feed_rx: Mutex<Option<mpsc::Receiver<RoundRecord>>>,
    feed_tx: Mutex<Option<mpsc::Sender<RoundRecord>>>,
}

impl MockBeacon {
    pub fn new(info: ChainInfo, latest: RoundNumber) -> Self {
        let (tx, rx) = mpsc::channel(16);
        Self {
            info,
            latest: Mutex::new(latest),
            calls: Mutex::new(Vec::new()),
            failing_rounds: Mutex::new(HashSet::new()),
            hang_info: AtomicBool::new(false),
            feed_rx: Mutex::new(Some(rx)),
            feed_tx: Mutex::new(Some(tx)),
        }
    }

    /// Publish a round on the live feed (also becomes the latest round).
    pub async fn publish(&self, round: RoundNumber) {
        *self.latest.lock() = round;
        let tx = self.feed_tx.lock().clone();
        if let Some(tx) = tx {
            tx.send(record(round)).await.unwrap();
        }
    }

    /// Close the live feed.
    pub fn close_feed(&self) {
        self.feed_tx.lock().take();
    }

    pub fn fail_round(&self, round: RoundNumber) {
        self.failing_rounds.lock().insert(round);
    }

    /// Make `info()` never resolve.
    pub fn hang_info(&self) {
        self.hang_info.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<BeaconCall> {
        self.calls.lock().clone()
    }

    /// Rounds requested through `get`, in order.
    pub fn fetched_rounds(&self) -> Vec<RoundNumber> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                BeaconCall::Get(round) => Some(*round),
                _ => None,
            })
            .collect()
    }
}

impl BeaconSource for MockBeacon {
    fn info(&self) -> BoxFuture<'_, BeaconResult<ChainInfo>> {
        self.calls.lock().push(BeaconCall::Info);
        Box::pin(async move {
            if self.hang_info.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            Ok(self.info.clone())
        })
    }

    fn get(&self, round: RoundNumber) -> BoxFuture<'_, BeaconResult<RoundRecord>> {
        self.calls.lock().push(BeaconCall::Get(round));
        let latest = *self.latest.lock();
        let failing = self.failing_rounds.lock().contains(&round);
        Box::pin(async move {
            if failing {
                return Err(BeaconError::HttpClient(format!("round {round} unavailable")));
            }
            match round {
                0 => Ok(record(latest)),
                r if r > latest => Err(BeaconError::RoundNotFound(r)),
                r => Ok(record(r)),
            }
        })
    }

    fn watch(&self, cancel: CancellationToken) -> mpsc::Receiver<RoundRecord> {
        self.calls.lock().push(BeaconCall::Watch);
        let Some(mut feed) = self.feed_rx.lock().take() else {
            let (_tx, rx) = mpsc::channel(1);
            return rx;
        };
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => return,
                    next = feed.recv() => match next {
                        Some(record) => {
                            if tx.send(record).await.is_err() {
                                return;
                            }
                        }
                        None => return,
                    },
                }
            }
        });
        rx
    }
}

// ============================================================================
// Chain (oracle contract + RPC)
// ============================================================================

/// Call received by [`MockChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainCall {
    ChainHash,
    EarliestRound,
    LatestRound,
    GasPrice,
    SetRandomness(RoundNumber),
    WaitMined(TxHash),
    Balance(Address),
}

/// Oracle contract and chain RPC sharing one call log.
///
/// A successful receipt advances the mock oracle's latest round; a round the
/// oracle already holds reverts.
pub struct MockChain {
    chain_hash: B256,
    earliest: RoundNumber,
    latest: Mutex<RoundNumber>,
    calls: Mutex<Vec<ChainCall>>,
    submitted: Mutex<Vec<(RandomnessUpdate, SubmitOptions)>>,
    pending: Mutex<Vec<(TxHash, RoundNumber)>>,
    /// Scripted receipt statuses; success once exhausted.
    receipts: Mutex<VecDeque<bool>>,
    gas_price_failures: AtomicU32,
    gas_price_always_fails: AtomicBool,
    gas_price_calls_at: Mutex<Vec<Instant>>,
    balance_fails: AtomicBool,
    hang_receipts: AtomicBool,
    mine_without_receipt: AtomicBool,
}

impl MockChain {
    pub fn new(chain_hash: B256, latest: RoundNumber) -> Self {
        Self {
            chain_hash,
            earliest: if latest == 0 { 0 } else { 1 },
            latest: Mutex::new(latest),
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            receipts: Mutex::new(VecDeque::new()),
            gas_price_failures: AtomicU32::new(0),
            gas_price_always_fails: AtomicBool::new(false),
            gas_price_calls_at: Mutex::new(Vec::new()),
            balance_fails: AtomicBool::new(false),
            hang_receipts: AtomicBool::new(false),
            mine_without_receipt: AtomicBool::new(false),
        }
    }

    pub fn script_receipts(&self, statuses: impl IntoIterator<Item = bool>) {
        self.receipts.lock().extend(statuses);
    }

    pub fn fail_gas_price(&self, times: u32) {
        self.gas_price_failures.store(times, Ordering::SeqCst);
    }

    pub fn fail_gas_price_always(&self) {
        self.gas_price_always_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_balance(&self) {
        self.balance_fails.store(true, Ordering::SeqCst);
    }

    pub fn hang_receipts(&self) {
        self.hang_receipts.store(true, Ordering::SeqCst);
    }

    /// The next transaction lands on-chain but its receipt never arrives.
    pub fn mine_without_receipt(&self) {
        self.mine_without_receipt.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ChainCall> {
        self.calls.lock().clone()
    }

    pub fn latest(&self) -> RoundNumber {
        *self.latest.lock()
    }

    /// Rounds passed to `setRandomness`, in order.
    pub fn submitted_rounds(&self) -> Vec<RoundNumber> {
        self.submitted.lock().iter().map(|(u, _)| u.round).collect()
    }

    pub fn submitted(&self) -> Vec<(RandomnessUpdate, SubmitOptions)> {
        self.submitted.lock().clone()
    }

    /// Virtual instants of every gas price request.
    pub fn gas_price_calls_at(&self) -> Vec<Instant> {
        self.gas_price_calls_at.lock().clone()
    }

    pub fn balance_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, ChainCall::Balance(_)))
            .count()
    }
}

fn tx_hash_for(round: RoundNumber, attempt: usize) -> TxHash {
    let mut bytes = [0u8; 32];
    bytes[16..24].copy_from_slice(&round.to_be_bytes());
    bytes[24..].copy_from_slice(&(attempt as u64).to_be_bytes());
    TxHash::from(bytes)
}

impl OracleContract for MockChain {
    fn earliest_round(&self) -> BoxFuture<'_, ChainResult<RoundNumber>> {
        self.calls.lock().push(ChainCall::EarliestRound);
        Box::pin(async move { Ok(self.earliest) })
    }

    fn latest_round(&self) -> BoxFuture<'_, ChainResult<RoundNumber>> {
        self.calls.lock().push(ChainCall::LatestRound);
        Box::pin(async move { Ok(*self.latest.lock()) })
    }

    fn chain_hash(&self) -> BoxFuture<'_, ChainResult<B256>> {
        self.calls.lock().push(ChainCall::ChainHash);
        Box::pin(async move { Ok(self.chain_hash) })
    }

    fn set_randomness(
        &self,
        options: SubmitOptions,
        update: RandomnessUpdate,
        _auth_signature: Bytes,
    ) -> BoxFuture<'_, ChainResult<TxHash>> {
        self.calls.lock().push(ChainCall::SetRandomness(update.round));
        Box::pin(async move {
            let round = update.round;
            let mut submitted = self.submitted.lock();
            submitted.push((update, options));
            let hash = tx_hash_for(round, submitted.len());
            self.pending.lock().push((hash, round));
            Ok(hash)
        })
    }
}

impl ChainRpc for MockChain {
    fn suggest_gas_price(&self) -> BoxFuture<'_, ChainResult<u128>> {
        self.calls.lock().push(ChainCall::GasPrice);
        self.gas_price_calls_at.lock().push(Instant::now());
        Box::pin(async move {
            if self.gas_price_always_fails.load(Ordering::SeqCst) {
                return Err(ChainError::Rpc("eth_gasPrice: connection refused".to_string()));
            }
            let remaining = self.gas_price_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.gas_price_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(ChainError::Rpc("eth_gasPrice: connection refused".to_string()));
            }
            Ok(1_000_000_000)
        })
    }

    fn balance_at(&self, address: Address) -> BoxFuture<'_, ChainResult<U256>> {
        self.calls.lock().push(ChainCall::Balance(address));
        Box::pin(async move {
            if self.balance_fails.load(Ordering::SeqCst) {
                return Err(ChainError::Rpc("eth_getBalance: timeout".to_string()));
            }
            Ok(U256::from(2_000_000_000_000_000_000u128))
        })
    }

    fn wait_mined(&self, tx_hash: TxHash) -> BoxFuture<'_, ChainResult<MinedReceipt>> {
        self.calls.lock().push(ChainCall::WaitMined(tx_hash));
        Box::pin(async move {
            if self.hang_receipts.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            let round = self
                .pending
                .lock()
                .iter()
                .find(|(hash, _)| *hash == tx_hash)
                .map(|(_, round)| *round);
            let scripted = self.receipts.lock().pop_front().unwrap_or(true);
            let success = {
                let mut latest = self.latest.lock();
                match round {
                    Some(round) if scripted && round > *latest => {
                        *latest = round;
                        true
                    }
                    Some(_) => false,
                    None => scripted,
                }
            };
            if success && self.mine_without_receipt.swap(false, Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            Ok(MinedReceipt {
                tx_hash,
                success,
                block_number: Some(1),
            })
        })
    }
}

// ============================================================================
// Signer
// ============================================================================

/// Authorization signer returning a fixed 65-byte signature.
#[derive(Default)]
pub struct MockSigner {
    calls: Mutex<Vec<(RoundNumber, u64)>>,
    always_fails: AtomicBool,
}

impl MockSigner {
    pub fn fail_always(&self) {
        self.always_fails.store(true, Ordering::SeqCst);
    }

    /// `(round, timestamp)` of every signing request.
    pub fn calls(&self) -> Vec<(RoundNumber, u64)> {
        self.calls.lock().clone()
    }
}

impl AuthSigner for MockSigner {
    fn sign_set_randomness(
        &self,
        round: RoundNumber,
        timestamp: u64,
        _randomness: B256,
        _signature: Bytes,
    ) -> BoxFuture<'_, ChainResult<Bytes>> {
        self.calls.lock().push((round, timestamp));
        Box::pin(async move {
            if self.always_fails.load(Ordering::SeqCst) {
                return Err(ChainError::TransactionBuild("signer unavailable".to_string()));
            }
            Ok(Bytes::from(vec![0x5a; 65]))
        })
    }
}
