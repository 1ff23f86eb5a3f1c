//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Beacon error: {0}")]
    Beacon(#[from] updater_beacon::BeaconError),

    #[error("Chain error: {0}")]
    Chain(#[from] updater_chain::ChainError),

    #[error("Key error: {0}")]
    Key(#[from] updater_chain::KeyError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] updater_telemetry::TelemetryError),

    #[error("Updater error: {0}")]
    Updater(#[from] updater_service::UpdaterError),

    #[error("Startup timed out: {0}")]
    Timeout(String),
}

pub type AppResult<T> = Result<T, AppError>;
