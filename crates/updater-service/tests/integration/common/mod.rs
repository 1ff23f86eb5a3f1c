//! Shared fixtures for relay integration tests.

#![allow(dead_code)]

pub mod mock;

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use alloy::signers::local::PrivateKeySigner;
use updater_chain::Sender;
use updater_core::{ChainInfo, RoundNumber, RoundRecord};
use updater_service::{Collaborators, UpdaterParams};
use updater_telemetry::{MetricLabels, RelayMetrics};

use mock::{MockBeacon, MockChain, MockSigner};

/// Hash shared by the mock beacon and the mock oracle unless a test says otherwise.
pub const CHAIN_HASH: B256 = B256::repeat_byte(0x52);

/// Oracle address used throughout.
pub const ORACLE: Address = Address::repeat_byte(0x0a);

/// drand quicknet parameters.
pub fn chain_info() -> ChainInfo {
    ChainInfo::new(1_692_803_367, Duration::from_secs(3), CHAIN_HASH).unwrap()
}

/// Deterministic record for `round`.
pub fn record(round: RoundNumber) -> RoundRecord {
    let mut randomness = [0u8; 32];
    randomness[24..].copy_from_slice(&round.to_be_bytes());
    RoundRecord::new(round, B256::from(randomness), Bytes::from(vec![0xbb; 48]))
}

pub fn test_sender() -> Sender {
    let signer: PrivateKeySigner = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        .parse()
        .unwrap();
    Sender::new(signer)
}

pub fn test_metrics() -> Arc<RelayMetrics> {
    Arc::new(
        RelayMetrics::new(MetricLabels {
            chain_id: 31337,
            oracle_address: ORACLE.to_string(),
            updater_address: test_sender().address().to_string(),
            drand_chain_hash: CHAIN_HASH.to_string(),
        })
        .unwrap(),
    )
}

/// Params with fast, deterministic timings.
pub fn test_params() -> UpdaterParams {
    UpdaterParams {
        oracle_address: ORACLE,
        chain_id: 31337,
        set_randomness_gas_limit: 300_000,
        genesis_round: 1,
        max_retries: 3,
        retry_base_delay: Duration::from_secs(1),
        balance_interval: Duration::from_secs(60),
        bootstrap_timeout: Duration::from_secs(10),
        confirmation_timeout: Some(Duration::from_secs(30)),
    }
}

/// Mocks plus the collaborator bundle built from them.
pub struct Harness {
    pub beacon: Arc<MockBeacon>,
    pub chain: Arc<MockChain>,
    pub signer: Arc<MockSigner>,
    pub metrics: Arc<RelayMetrics>,
    pub collaborators: Collaborators,
}

impl Harness {
    /// Oracle at `oracle_round`, beacon at `beacon_round`, matching chain hashes.
    pub fn new(oracle_round: RoundNumber, beacon_round: RoundNumber) -> Self {
        Self::from_mocks(
            MockBeacon::new(chain_info(), beacon_round),
            MockChain::new(CHAIN_HASH, oracle_round),
        )
    }

    pub fn from_mocks(beacon: MockBeacon, chain: MockChain) -> Self {
        let beacon = Arc::new(beacon);
        let chain = Arc::new(chain);
        let signer = Arc::new(MockSigner::default());
        let metrics = test_metrics();
        let collaborators = Collaborators {
            beacon: beacon.clone(),
            oracle: chain.clone(),
            rpc: chain.clone(),
            signer: signer.clone(),
            sender: test_sender(),
            metrics: metrics.clone(),
        };
        Self {
            beacon,
            chain,
            signer,
            metrics,
            collaborators,
        }
    }
}

/// Poll `cond` every 10ms (virtual or real time) up to `attempts` times.
pub async fn wait_until(attempts: usize, mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..attempts {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
