//! Beacon error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Round {0} not found")]
    RoundNotFound(u64),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Chain hash mismatch: configured {configured}, served {served}")]
    ChainHashMismatch { configured: String, served: String },

    #[error("No beacon endpoints configured")]
    NoEndpoints,

    #[error("Invalid round data: {0}")]
    Core(#[from] updater_core::CoreError),

    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub type BeaconResult<T> = Result<T, BeaconError>;
