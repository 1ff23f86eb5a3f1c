//! HTTP client for the drand public API.
//!
//! Endpoints (relative to `{url}` or `{url}/{chain_hash}`):
//! - `GET /info` -> chain metadata
//! - `GET /public/{round}` -> a specific round
//! - `GET /public/latest` -> the most recent round
//!
//! Multiple relay URLs may be configured; they are tried in order and the
//! first successful response wins.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use updater_core::{ChainInfo, RoundNumber, RoundRecord};

use crate::error::{BeaconError, BeaconResult};
use crate::source::{BeaconSource, BoxFuture, DynBeaconSource, LATEST_ROUND};
use crate::watch::PollingWatcher;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay before re-polling when a round is late or a request failed.
const DEFAULT_WATCH_RETRY: Duration = Duration::from_millis(500);

/// Capacity of the watch channel. Kept at one so a slow consumer throttles polling.
const WATCH_CHANNEL_CAPACITY: usize = 1;

/// Beacon client configuration.
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    /// drand relay base URLs (e.g. "https://api.drand.sh").
    pub urls: Vec<String>,
    /// Chain hash selecting the beacon on multi-chain relays.
    /// If set, the served info hash must match it.
    pub chain_hash: Option<B256>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Delay before re-polling a late round or after a failed poll.
    pub watch_retry_delay: Duration,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            urls: vec!["https://api.drand.sh".to_string()],
            chain_hash: None,
            request_timeout: DEFAULT_TIMEOUT,
            watch_retry_delay: DEFAULT_WATCH_RETRY,
        }
    }
}

/// Raw `/info` response.
#[derive(Debug, Deserialize)]
struct InfoResponse {
    /// Round period in seconds.
    period: u64,
    /// Unix time of round 1.
    genesis_time: u64,
    /// Chain hash (hex).
    hash: String,
    /// Signature scheme (informational).
    #[serde(rename = "schemeID", default)]
    scheme_id: Option<String>,
}

impl InfoResponse {
    fn into_chain_info(self) -> BeaconResult<ChainInfo> {
        let hash = decode_hex(&self.hash)?;
        if hash.len() != 32 {
            return Err(BeaconError::Decode(format!(
                "chain hash must be 32 bytes, got {}",
                hash.len()
            )));
        }
        Ok(ChainInfo::new(
            self.genesis_time,
            Duration::from_secs(self.period),
            B256::from_slice(&hash),
        )?)
    }
}

/// Raw `/public/{round}` response.
#[derive(Debug, Deserialize)]
struct RoundResponse {
    round: u64,
    /// Randomness (hex, 32 bytes).
    randomness: String,
    /// BLS signature (hex).
    signature: String,
}

impl RoundResponse {
    fn into_record(self) -> BeaconResult<RoundRecord> {
        let randomness = decode_hex(&self.randomness)?;
        let signature = decode_hex(&self.signature)?;
        Ok(RoundRecord::from_parts(self.round, &randomness, &signature)?)
    }
}

fn decode_hex(value: &str) -> BeaconResult<Vec<u8>> {
    Ok(hex::decode(value.trim().trim_start_matches("0x"))?)
}

/// drand HTTP beacon client.
#[derive(Clone)]
pub struct HttpBeacon {
    client: Client,
    config: Arc<BeaconConfig>,
}

impl HttpBeacon {
    /// Create a new beacon client.
    ///
    /// # Errors
    /// Returns `BeaconError::NoEndpoints` if no URL is configured, or
    /// `BeaconError::HttpClient` if the HTTP client cannot be built.
    pub fn new(config: BeaconConfig) -> BeaconResult<Self> {
        if config.urls.is_empty() {
            return Err(BeaconError::NoEndpoints);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BeaconError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Base URL for one relay, including the chain hash segment if configured.
    fn base_url(&self, url: &str) -> String {
        let trimmed = url.trim_end_matches('/');
        match self.config.chain_hash {
            Some(hash) => format!("{trimmed}/{}", hex::encode(hash)),
            None => trimmed.to_string(),
        }
    }

    /// Fetch chain metadata.
    pub async fn fetch_info(&self) -> BeaconResult<ChainInfo> {
        let response: InfoResponse = self.fetch_json("/info", None).await?;
        debug!(
            period = response.period,
            genesis_time = response.genesis_time,
            scheme = ?response.scheme_id,
            "Fetched drand chain info"
        );
        let info = response.into_chain_info()?;

        if let Some(configured) = self.config.chain_hash {
            if configured != info.hash {
                return Err(BeaconError::ChainHashMismatch {
                    configured: configured.to_string(),
                    served: info.hash.to_string(),
                });
            }
        }

        Ok(info)
    }

    /// Fetch a round, or the latest round for `LATEST_ROUND`.
    pub async fn fetch_round(&self, round: RoundNumber) -> BeaconResult<RoundRecord> {
        let path = if round == LATEST_ROUND {
            "/public/latest".to_string()
        } else {
            format!("/public/{round}")
        };
        let response: RoundResponse = self.fetch_json(&path, Some(round)).await?;
        response.into_record()
    }

    /// GET `path` from each relay in turn, returning the first success.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        round: Option<RoundNumber>,
    ) -> BeaconResult<T> {
        let mut last_error = BeaconError::NoEndpoints;

        for url in &self.config.urls {
            let full_url = format!("{}{}", self.base_url(url), path);
            match self.get_json(&full_url, round).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(url = %full_url, error = %e, "drand request failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        round: Option<RoundNumber>,
    ) -> BeaconResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BeaconError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(round) = round.filter(|r| *r != LATEST_ROUND) {
                return Err(BeaconError::RoundNotFound(round));
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BeaconError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BeaconError::Decode(format!("Failed to parse response: {e}")))
    }
}

impl BeaconSource for HttpBeacon {
    fn info(&self) -> BoxFuture<'_, BeaconResult<ChainInfo>> {
        Box::pin(self.fetch_info())
    }

    fn get(&self, round: RoundNumber) -> BoxFuture<'_, BeaconResult<RoundRecord>> {
        Box::pin(self.fetch_round(round))
    }

    fn watch(&self, cancel: CancellationToken) -> mpsc::Receiver<RoundRecord> {
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let source: DynBeaconSource = Arc::new(self.clone());
        let watcher = PollingWatcher::new(source, tx, self.config.watch_retry_delay);
        tokio::spawn(watcher.run(cancel));
        rx
    }
}
