//! Transaction-paying account.

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::chain::SubmitOptions;

/// Account that pays for and signs `setRandomness` transactions.
///
/// Cheap to clone; safe for concurrent read-only use (address lookup and
/// wallet access).
#[derive(Clone)]
pub struct Sender {
    address: Address,
    wallet: EthereumWallet,
}

impl Sender {
    /// Create a sender from a loaded key.
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            wallet: EthereumWallet::from(signer),
        }
    }

    /// Sender address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Wallet used to sign raw transactions.
    pub fn wallet(&self) -> EthereumWallet {
        self.wallet.clone()
    }

    /// Transaction options paying from this account.
    pub fn submit_options(&self, gas_limit: u64, gas_price: u128) -> SubmitOptions {
        SubmitOptions {
            from: self.address,
            wallet: self.wallet(),
            gas_limit,
            gas_price,
        }
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
