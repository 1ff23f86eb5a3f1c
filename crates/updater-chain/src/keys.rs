//! Private key loading.
//!
//! Security notes:
//! - Key material is decoded into `Zeroizing` buffers and handed straight to
//!   `PrivateKeySigner`.
//! - Keys are loaded once at startup; no runtime rotation.
//! - Never log private key material.

use std::path::PathBuf;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::KeyError;

/// Source of a private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar { var_name } => write!(f, "env:{var_name}"),
            Self::File { path } => write!(f, "file:{}", path.display()),
        }
    }
}

/// Parse a hex key (supports 0x prefix and whitespace trimming).
fn parse_hex_key(hex_str: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let trimmed = hex_str.trim().trim_start_matches("0x");
    Ok(Zeroizing::new(hex::decode(trimmed)?))
}

/// Load a signer from `source`, optionally verifying its address.
///
/// # Errors
/// Returns `KeyError` if:
/// - Environment variable not found
/// - File read fails
/// - Hex decoding fails
/// - Private key is invalid
/// - Address mismatch
pub fn load_private_key(
    source: &KeySource,
    expected_address: Option<Address>,
) -> Result<PrivateKeySigner, KeyError> {
    let secret_bytes = match source {
        KeySource::EnvVar { var_name } => {
            let hex = Zeroizing::new(
                std::env::var(var_name).map_err(|_| KeyError::EnvVarNotFound(var_name.clone()))?,
            );
            parse_hex_key(&hex)?
        }
        KeySource::File { path } => {
            let content = Zeroizing::new(std::fs::read_to_string(path)?);
            parse_hex_key(&content)?
        }
    };

    signer_from_bytes(&secret_bytes, expected_address)
}

/// Build a signer from raw key bytes, optionally verifying its address.
pub fn signer_from_bytes(
    secret_bytes: &[u8],
    expected_address: Option<Address>,
) -> Result<PrivateKeySigner, KeyError> {
    let signer = PrivateKeySigner::from_slice(secret_bytes)
        .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

    if let Some(expected) = expected_address {
        if signer.address() != expected {
            return Err(KeyError::AddressMismatch {
                expected,
                actual: signer.address(),
            });
        }
    }

    Ok(signer)
}
