//! EIP-712 authorization signer for `setRandomness`.
//!
//! The oracle only accepts an update when it carries a signature by the
//! configured signer over the typed struct
//! `SetRandomness(uint64 round,uint64 timestamp,bytes32 randomness,bytes signature)`
//! under the domain `{name: "DrandOracle", version: "1.0", chainId, verifyingContract}`.

use alloy::primitives::{Address, Bytes, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use alloy::sol;
use alloy::sol_types::{eip712_domain, Eip712Domain, SolStruct};
use updater_core::RoundNumber;

use crate::chain::{AuthSigner, BoxFuture};
use crate::error::ChainResult;

/// EIP-712 domain constants.
pub const EIP712_DOMAIN_NAME: &str = "DrandOracle";
pub const EIP712_DOMAIN_VERSION: &str = "1.0";

// EIP-712 type definition using alloy sol! macro
sol! {
    #[derive(Debug)]
    struct SetRandomness {
        uint64 round;
        uint64 timestamp;
        bytes32 randomness;
        bytes signature;
    }
}

/// Signs `setRandomness` authorizations with a held key.
pub struct RandomnessSigner {
    signer: PrivateKeySigner,
    domain: Eip712Domain,
}

impl RandomnessSigner {
    /// Create a signer bound to the oracle at `oracle` on `chain_id`.
    pub fn new(signer: PrivateKeySigner, chain_id: u64, oracle: Address) -> Self {
        let domain = eip712_domain! {
            name: EIP712_DOMAIN_NAME,
            version: EIP712_DOMAIN_VERSION,
            chain_id: chain_id,
            verifying_contract: oracle,
        };
        Self { signer, domain }
    }

    /// Signer address (must match the oracle's configured signer).
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-712 signing hash: keccak256(0x1901 || domain_separator || struct_hash).
    pub fn signing_hash(
        &self,
        round: RoundNumber,
        timestamp: u64,
        randomness: B256,
        signature: Bytes,
    ) -> B256 {
        let message = SetRandomness {
            round,
            timestamp,
            randomness,
            signature,
        };
        message.eip712_signing_hash(&self.domain)
    }

    /// Sign and return the 65-byte `r || s || v` signature.
    pub async fn sign(
        &self,
        round: RoundNumber,
        timestamp: u64,
        randomness: B256,
        signature: Bytes,
    ) -> ChainResult<Bytes> {
        let hash = self.signing_hash(round, timestamp, randomness, signature);
        // NOTE: Do not log signatures
        let signed = self.signer.sign_hash(&hash).await?;
        Ok(Bytes::from(signed.as_bytes().to_vec()))
    }
}

impl AuthSigner for RandomnessSigner {
    fn sign_set_randomness(
        &self,
        round: RoundNumber,
        timestamp: u64,
        randomness: B256,
        signature: Bytes,
    ) -> BoxFuture<'_, ChainResult<Bytes>> {
        Box::pin(self.sign(round, timestamp, randomness, signature))
    }
}
