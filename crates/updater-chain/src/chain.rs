//! Chain-side collaborator traits.
//!
//! The relay engine talks to the chain through three seams:
//! - `OracleContract`: the oracle's views and its `setRandomness` entry point
//! - `ChainRpc`: gas price, balances and receipt polling
//! - `AuthSigner`: the EIP-712 authorization required by `setRandomness`
//!
//! All methods return boxed futures so the traits stay dyn-compatible and can
//! be replaced by scripted implementations in tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use updater_core::RoundNumber;

use crate::error::ChainResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Payload of a `setRandomness` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomnessUpdate {
    pub round: RoundNumber,
    /// Unix timestamp of the round.
    pub timestamp: u64,
    pub randomness: B256,
    /// Beacon signature over the round.
    pub signature: Bytes,
}

/// Authorization options for a state-changing transaction.
#[derive(Clone)]
pub struct SubmitOptions {
    /// Paying account.
    pub from: Address,
    /// Wallet that signs the raw transaction.
    pub wallet: EthereumWallet,
    pub gas_limit: u64,
    /// Legacy gas price in wei.
    pub gas_price: u128,
}

impl std::fmt::Debug for SubmitOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitOptions")
            .field("from", &self.from)
            .field("gas_limit", &self.gas_limit)
            .field("gas_price", &self.gas_price)
            .finish_non_exhaustive()
    }
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedReceipt {
    pub tx_hash: TxHash,
    /// Whether execution succeeded (receipt status 1).
    pub success: bool,
    pub block_number: Option<u64>,
}

/// Oracle contract binding.
pub trait OracleContract: Send + Sync {
    /// First round the oracle stores.
    fn earliest_round(&self) -> BoxFuture<'_, ChainResult<RoundNumber>>;

    /// Latest committed round (0 if never updated).
    fn latest_round(&self) -> BoxFuture<'_, ChainResult<RoundNumber>>;

    /// Beacon chain hash the oracle was deployed with.
    fn chain_hash(&self) -> BoxFuture<'_, ChainResult<B256>>;

    /// Broadcast a `setRandomness` transaction and return its hash.
    fn set_randomness(
        &self,
        options: SubmitOptions,
        update: RandomnessUpdate,
        auth_signature: Bytes,
    ) -> BoxFuture<'_, ChainResult<TxHash>>;
}

/// Chain JSON-RPC operations used by the relay.
pub trait ChainRpc: Send + Sync {
    /// Current gas price suggestion in wei.
    fn suggest_gas_price(&self) -> BoxFuture<'_, ChainResult<u128>>;

    /// Balance of `address` in wei.
    fn balance_at(&self, address: Address) -> BoxFuture<'_, ChainResult<U256>>;

    /// Wait until `tx_hash` is mined and return its receipt.
    ///
    /// Has no timeout of its own; callers bound it if needed.
    fn wait_mined(&self, tx_hash: TxHash) -> BoxFuture<'_, ChainResult<MinedReceipt>>;
}

/// Produces the authorization signature checked by `setRandomness`.
pub trait AuthSigner: Send + Sync {
    /// Sign `(round, timestamp, randomness, signature)`.
    fn sign_set_randomness(
        &self,
        round: RoundNumber,
        timestamp: u64,
        randomness: B256,
        signature: Bytes,
    ) -> BoxFuture<'_, ChainResult<Bytes>>;
}

/// Arc wrapper for OracleContract trait objects.
pub type DynOracleContract = Arc<dyn OracleContract>;

/// Arc wrapper for ChainRpc trait objects.
pub type DynChainRpc = Arc<dyn ChainRpc>;

/// Arc wrapper for AuthSigner trait objects.
pub type DynAuthSigner = Arc<dyn AuthSigner>;
