//! Chain error types.

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("ABI decode error: {0}")]
    Abi(String),

    #[error("Transaction build failed: {0}")]
    TransactionBuild(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] alloy::signers::Error),

    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),
}

pub type ChainResult<T> = Result<T, ChainError>;

/// Key management errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
