//! Prometheus metrics for the relay.
//!
//! Each `RelayMetrics` owns its registry. Every series carries the constant
//! labels identifying the deployment (chain id, oracle address, updater
//! address, drand chain hash), so several updaters can be scraped into one
//! Prometheus without clashing.

use std::collections::HashMap;

use prometheus::{Encoder, Gauge, GaugeVec, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use updater_core::{ChainInfo, RoundNumber};

use crate::error::TelemetryResult;

/// Constant labels attached to every series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLabels {
    pub chain_id: u64,
    pub oracle_address: String,
    pub updater_address: String,
    pub drand_chain_hash: String,
}

impl MetricLabels {
    fn into_map(self) -> HashMap<String, String> {
        HashMap::from([
            ("chain_id".to_string(), self.chain_id.to_string()),
            ("oracle_address".to_string(), self.oracle_address),
            ("updater_address".to_string(), self.updater_address),
            ("drand_chain_hash".to_string(), self.drand_chain_hash),
        ])
    }
}

/// Metrics sink of the relay engine.
pub struct RelayMetrics {
    registry: Registry,
    drand_round: IntGauge,
    oracle_round: IntGauge,
    set_randomness_success: IntCounter,
    set_randomness_failure: IntCounter,
    balance_wei: Gauge,
    drand_info: GaugeVec,
}

impl RelayMetrics {
    /// Create and register all series.
    pub fn new(labels: MetricLabels) -> TelemetryResult<Self> {
        let registry = Registry::new_custom(None, Some(labels.into_map()))?;

        let drand_round = IntGauge::new("drand_round", "Latest round seen from the drand beacon")?;
        let oracle_round =
            IntGauge::new("oracle_round", "Latest round committed to the oracle contract")?;
        let set_randomness_success = IntCounter::new(
            "set_randomness_success_total",
            "setRandomness transactions mined successfully",
        )?;
        let set_randomness_failure = IntCounter::new(
            "set_randomness_failure_total",
            "setRandomness transactions mined with a failed status",
        )?;
        let balance_wei = Gauge::new("updater_balance_wei", "Balance of the updater account in wei")?;
        let drand_info = GaugeVec::new(
            Opts::new("drand_info", "drand beacon chain parameters"),
            &["period_secs", "genesis_time"],
        )?;

        registry.register(Box::new(drand_round.clone()))?;
        registry.register(Box::new(oracle_round.clone()))?;
        registry.register(Box::new(set_randomness_success.clone()))?;
        registry.register(Box::new(set_randomness_failure.clone()))?;
        registry.register(Box::new(balance_wei.clone()))?;
        registry.register(Box::new(drand_info.clone()))?;

        Ok(Self {
            registry,
            drand_round,
            oracle_round,
            set_randomness_success,
            set_randomness_failure,
            balance_wei,
            drand_info,
        })
    }

    pub fn set_drand_round(&self, round: RoundNumber) {
        self.drand_round.set(clamp_i64(round));
    }

    pub fn set_oracle_round(&self, round: RoundNumber) {
        self.oracle_round.set(clamp_i64(round));
    }

    pub fn inc_set_randomness_success(&self) {
        self.set_randomness_success.inc();
    }

    pub fn inc_set_randomness_failure(&self) {
        self.set_randomness_failure.inc();
    }

    /// Record the updater balance. Precision loss above 2^53 wei is accepted.
    pub fn set_balance_wei(&self, wei: f64) {
        self.balance_wei.set(wei);
    }

    /// Publish the beacon chain parameters as an info series.
    pub fn set_drand_info(&self, info: &ChainInfo) {
        self.drand_info
            .with_label_values(&[
                &info.period_secs().to_string(),
                &info.genesis_time.to_string(),
            ])
            .set(1.0);
    }

    pub fn drand_round(&self) -> i64 {
        self.drand_round.get()
    }

    pub fn oracle_round(&self) -> i64 {
        self.oracle_round.get()
    }

    pub fn set_randomness_success(&self) -> u64 {
        self.set_randomness_success.get()
    }

    pub fn set_randomness_failure(&self) -> u64 {
        self.set_randomness_failure.get()
    }

    pub fn balance_wei(&self) -> f64 {
        self.balance_wei.get()
    }

    /// Registry backing these metrics.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode_text(&self) -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn clamp_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
