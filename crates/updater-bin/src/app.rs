//! Application wiring.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use updater_beacon::{BeaconSource, HttpBeacon};
use updater_chain::{load_private_key, OracleClient, RandomnessSigner, Sender};
use updater_service::{Collaborators, Updater};
use updater_telemetry::{serve_metrics, MetricLabels, RelayMetrics};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// The updater process.
pub struct Application {
    config: AppConfig,
}

impl Application {
    /// Create the application from a validated configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build every collaborator and run the relay until `cancel` fires or it fails.
    pub async fn run(self, cancel: CancellationToken) -> AppResult<()> {
        let config = &self.config;
        let oracle_address = config.oracle_address()?;

        // NOTE: Never log private key material
        let signer_key = load_private_key(&config.keys.signer, config.signer_address()?)?;
        let sender_key = load_private_key(&config.keys.sender, config.sender_address()?)?;
        let signer = RandomnessSigner::new(signer_key, config.chain.chain_id, oracle_address);
        let sender = Sender::new(sender_key);
        info!(
            signer = %signer.address(),
            sender = %sender.address(),
            key_source = %config.keys.sender,
            "Keys loaded"
        );

        let beacon = Arc::new(HttpBeacon::new(config.beacon_config()?)?);
        let oracle = Arc::new(OracleClient::new(config.oracle_client_config()?)?);

        let timeout = config.bootstrap_timeout();
        let drand_info = tokio::time::timeout(timeout, beacon.info())
            .await
            .map_err(|_| AppError::Timeout(format!("drand info after {timeout:?}")))??;
        info!(
            chain_hash = %drand_info.hash,
            period_secs = drand_info.period_secs(),
            genesis_time = drand_info.genesis_time,
            "drand chain info"
        );

        let metrics = Arc::new(RelayMetrics::new(MetricLabels {
            chain_id: config.chain.chain_id,
            oracle_address: oracle_address.to_string(),
            updater_address: sender.address().to_string(),
            drand_chain_hash: drand_info.hash.to_string(),
        })?);

        if config.telemetry.enabled {
            let metrics = metrics.clone();
            let port = config.telemetry.metrics_port;
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_metrics(metrics, port, cancel).await {
                    error!(error = %e, port, "Metrics server failed");
                }
            });
        }

        let updater = Updater::new(
            config.updater_params(),
            Collaborators {
                beacon,
                oracle: oracle.clone(),
                rpc: oracle,
                signer: Arc::new(signer),
                sender,
                metrics,
            },
        )?;

        updater.run(cancel).await?;
        Ok(())
    }
}
