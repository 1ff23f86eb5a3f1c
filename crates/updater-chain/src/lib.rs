//! On-chain side of the drand oracle updater.
//!
//! - `OracleContract` / `ChainRpc`: dyn-compatible seams consumed by the relay
//! - `OracleClient`: alloy JSON-RPC implementation of both
//! - `RandomnessSigner`: EIP-712 authorization signatures for `setRandomness`
//! - `Sender`: transaction-paying account
//! - `KeySource`: private key loading

pub mod chain;
pub mod error;
pub mod keys;
pub mod oracle;
pub mod sender;
pub mod signer;

pub use chain::{
    AuthSigner, BoxFuture, ChainRpc, DynAuthSigner, DynChainRpc, DynOracleContract,
    MinedReceipt, OracleContract, RandomnessUpdate, SubmitOptions,
};
pub use error::{ChainError, ChainResult, KeyError};
pub use keys::{load_private_key, KeySource};
pub use oracle::{OracleClient, OracleClientConfig};
pub use sender::Sender;
pub use signer::RandomnessSigner;
