//! JSON-RPC binding of the drand oracle contract.
//!
//! Views go through `eth_call`. `setRandomness` is built as a legacy
//! transaction, signed locally with the sender's wallet and broadcast with
//! `eth_sendRawTransaction`. Receipts are polled until the transaction mines.

use std::time::Duration;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::eth::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use alloy::transports::http::{Client, Http};
use tracing::{debug, trace};
use updater_core::RoundNumber;

use crate::chain::{BoxFuture, ChainRpc, MinedReceipt, OracleContract, RandomnessUpdate, SubmitOptions};
use crate::error::{ChainError, ChainResult};

sol! {
    interface IDrandOracle {
        struct Random {
            uint64 round;
            uint64 timestamp;
            bytes32 randomness;
            bytes signature;
        }

        function CHAIN_HASH() external view returns (bytes32);
        function earliestRound() external view returns (uint64);
        function latestRound() external view returns (uint64);
        function setRandomness(Random calldata random, bytes calldata signature) external;
    }
}

/// Connection settings for [`OracleClient`].
#[derive(Debug, Clone)]
pub struct OracleClientConfig {
    /// Chain JSON-RPC endpoint.
    pub rpc_url: String,
    /// Deployed oracle contract.
    pub oracle_address: Address,
    /// Chain id stamped on outgoing transactions.
    pub chain_id: u64,
    /// Interval between `eth_getTransactionReceipt` polls.
    pub receipt_poll_interval: Duration,
}

/// Oracle contract and chain RPC over an HTTP provider.
#[derive(Clone)]
pub struct OracleClient {
    provider: RootProvider<Http<Client>>,
    oracle: Address,
    chain_id: u64,
    receipt_poll_interval: Duration,
}

impl OracleClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: OracleClientConfig) -> ChainResult<Self> {
        let url = config
            .rpc_url
            .parse()
            .map_err(|e| ChainError::InvalidUrl(format!("{}: {e}", config.rpc_url)))?;
        let provider = ProviderBuilder::new().on_http(url);
        Ok(Self {
            provider,
            oracle: config.oracle_address,
            chain_id: config.chain_id,
            receipt_poll_interval: config.receipt_poll_interval,
        })
    }

    /// Oracle address.
    pub fn oracle_address(&self) -> Address {
        self.oracle
    }

    /// Chain id used for transactions.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn view<C: SolCall>(&self, call: C) -> ChainResult<C::Return> {
        let request = TransactionRequest::default()
            .with_to(self.oracle)
            .with_input(call.abi_encode());
        let raw = self
            .provider
            .call(&request)
            .await
            .map_err(|e| ChainError::Rpc(format!("eth_call {}: {e}", C::SIGNATURE)))?;
        C::abi_decode_returns(raw.as_ref(), true)
            .map_err(|e| ChainError::Abi(format!("{}: {e}", C::SIGNATURE)))
    }

    async fn send_set_randomness(
        &self,
        options: SubmitOptions,
        update: RandomnessUpdate,
        auth_signature: Bytes,
    ) -> ChainResult<TxHash> {
        let nonce = self
            .provider
            .get_transaction_count(options.from)
            .pending()
            .await
            .map_err(|e| ChainError::Rpc(format!("eth_getTransactionCount: {e}")))?;

        let calldata = encode_set_randomness(&update, auth_signature);
        let mut tx = TransactionRequest::default()
            .with_to(self.oracle)
            .with_input(calldata)
            .with_chain_id(self.chain_id)
            .with_nonce(nonce)
            .with_gas_limit(options.gas_limit)
            .with_gas_price(options.gas_price);
        tx.from = Some(options.from);

        let envelope = tx
            .build(&options.wallet)
            .await
            .map_err(|e| ChainError::TransactionBuild(e.to_string()))?;
        let encoded = envelope.encoded_2718();

        debug!(
            round = update.round,
            nonce,
            gas_price = options.gas_price,
            "Broadcasting setRandomness"
        );
        let pending = self
            .provider
            .send_raw_transaction(&encoded)
            .await
            .map_err(|e| ChainError::Rpc(format!("eth_sendRawTransaction: {e}")))?;
        Ok(*pending.tx_hash())
    }

    async fn poll_receipt(&self, tx_hash: TxHash) -> ChainResult<MinedReceipt> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ChainError::Rpc(format!("eth_getTransactionReceipt: {e}")))?;
            match receipt {
                Some(receipt) => {
                    return Ok(MinedReceipt {
                        tx_hash,
                        success: receipt.status(),
                        block_number: receipt.block_number,
                    })
                }
                None => {
                    trace!(%tx_hash, "Transaction not mined yet");
                    tokio::time::sleep(self.receipt_poll_interval).await;
                }
            }
        }
    }
}

/// ABI-encode `setRandomness((uint64,uint64,bytes32,bytes),bytes)`.
pub fn encode_set_randomness(update: &RandomnessUpdate, auth_signature: Bytes) -> Bytes {
    let call = IDrandOracle::setRandomnessCall {
        random: IDrandOracle::Random {
            round: update.round,
            timestamp: update.timestamp,
            randomness: update.randomness,
            signature: update.signature.clone(),
        },
        signature: auth_signature,
    };
    Bytes::from(call.abi_encode())
}

impl OracleContract for OracleClient {
    fn earliest_round(&self) -> BoxFuture<'_, ChainResult<RoundNumber>> {
        Box::pin(async move {
            let ret = self.view(IDrandOracle::earliestRoundCall {}).await?;
            Ok(ret._0)
        })
    }

    fn latest_round(&self) -> BoxFuture<'_, ChainResult<RoundNumber>> {
        Box::pin(async move {
            let ret = self.view(IDrandOracle::latestRoundCall {}).await?;
            Ok(ret._0)
        })
    }

    fn chain_hash(&self) -> BoxFuture<'_, ChainResult<B256>> {
        Box::pin(async move {
            let ret = self.view(IDrandOracle::CHAIN_HASHCall {}).await?;
            Ok(ret._0)
        })
    }

    fn set_randomness(
        &self,
        options: SubmitOptions,
        update: RandomnessUpdate,
        auth_signature: Bytes,
    ) -> BoxFuture<'_, ChainResult<TxHash>> {
        Box::pin(self.send_set_randomness(options, update, auth_signature))
    }
}

impl ChainRpc for OracleClient {
    fn suggest_gas_price(&self) -> BoxFuture<'_, ChainResult<u128>> {
        Box::pin(async move {
            self.provider
                .get_gas_price()
                .await
                .map_err(|e| ChainError::Rpc(format!("eth_gasPrice: {e}")))
        })
    }

    fn balance_at(&self, address: Address) -> BoxFuture<'_, ChainResult<U256>> {
        Box::pin(async move {
            self.provider
                .get_balance(address)
                .await
                .map_err(|e| ChainError::Rpc(format!("eth_getBalance: {e}")))
        })
    }

    fn wait_mined(&self, tx_hash: TxHash) -> BoxFuture<'_, ChainResult<MinedReceipt>> {
        Box::pin(self.poll_receipt(tx_hash))
    }
}
