//! Round processor: the sole consumer of the round queue.
//!
//! Per round: `validating → signing → submitting → confirming →
//! {committed | skipped | failed}`. The oracle cursor lock is taken at
//! validation and held until the round ends, so only one `setRandomness`
//! is ever in flight and the committed sequence advances by exactly one.

use std::sync::Arc;

use alloy::primitives::TxHash;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use updater_chain::{
    DynAuthSigner, DynChainRpc, DynOracleContract, MinedReceipt, RandomnessUpdate, Sender,
};
use updater_core::{ChainInfo, RoundNumber, RoundRecord};
use updater_telemetry::RelayMetrics;

use crate::config::UpdaterParams;
use crate::error::{UpdaterError, UpdaterResult};
use crate::queue::RoundReceiver;
use crate::state::SharedState;
use crate::updater::Collaborators;

/// How a round left the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Mined successfully; the oracle cursor now points at this round.
    Committed { tx_hash: TxHash },
    /// A failed or unconfirmed submission found the round already on-chain;
    /// the oracle cursor was moved to the contract's latest round.
    AlreadyCommitted { latest_oracle_round: RoundNumber },
    /// Not the oracle's successor round; discarded without side effects.
    Skipped,
    /// Cancelled before the round finished.
    Cancelled,
}

/// Sequential consumer that signs, submits and confirms rounds.
pub struct RoundProcessor {
    params: UpdaterParams,
    chain_info: ChainInfo,
    state: Arc<SharedState>,
    oracle: DynOracleContract,
    rpc: DynChainRpc,
    signer: DynAuthSigner,
    sender: Sender,
    metrics: Arc<RelayMetrics>,
}

impl RoundProcessor {
    pub fn new(
        params: UpdaterParams,
        chain_info: ChainInfo,
        state: Arc<SharedState>,
        collaborators: &Collaborators,
    ) -> Self {
        Self {
            params,
            chain_info,
            state,
            oracle: collaborators.oracle.clone(),
            rpc: collaborators.rpc.clone(),
            signer: collaborators.signer.clone(),
            sender: collaborators.sender.clone(),
            metrics: collaborators.metrics.clone(),
        }
    }

    /// Consume the queue until cancellation, queue closure or a fatal error.
    ///
    /// # Errors
    /// `RetriesExhausted` when a round fails `max_retries` times.
    pub async fn run(self, mut queue: RoundReceiver, cancel: CancellationToken) -> UpdaterResult<()> {
        while let Some(record) = queue.pop(&cancel).await {
            if self.process_with_retry(&record, &cancel).await? == RoundOutcome::Cancelled {
                debug!("Round processor cancelled");
                return Ok(());
            }
        }
        debug!("Round queue closed, round processor finished");
        Ok(())
    }

    /// Process one round, retrying failures with exponential backoff.
    pub async fn process_with_retry(
        &self,
        record: &RoundRecord,
        cancel: &CancellationToken,
    ) -> UpdaterResult<RoundOutcome> {
        let max_retries = self.params.max_retries.max(1);
        let mut attempt = 0u32;

        loop {
            let result = tokio::select! {
                () = cancel.cancelled() => return Ok(RoundOutcome::Cancelled),
                result = self.process_round(record) => result,
            };

            let err = match result {
                Ok(outcome) => return Ok(outcome),
                Err(e) => e,
            };

            attempt += 1;
            if attempt >= max_retries {
                error!(
                    round = record.round,
                    attempts = attempt,
                    error = %err,
                    "Failed to process round after all retries"
                );
                return Err(UpdaterError::RetriesExhausted {
                    round: record.round,
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let backoff = self.params.backoff(attempt - 1);
            warn!(
                round = record.round,
                attempt,
                backoff_secs = backoff.as_secs_f64(),
                error = %err,
                "Retrying round processing after backoff"
            );
            tokio::select! {
                () = cancel.cancelled() => return Ok(RoundOutcome::Cancelled),
                () = tokio::time::sleep(backoff) => {}
            }
        }
    }

    /// Whether `round` may be written on top of `latest_oracle`.
    fn is_successor(&self, latest_oracle: RoundNumber, round: RoundNumber) -> bool {
        if latest_oracle == 0 {
            round == self.params.genesis_round
        } else {
            latest_oracle.checked_add(1) == Some(round)
        }
    }

    /// One attempt at a round.
    pub async fn process_round(&self, record: &RoundRecord) -> UpdaterResult<RoundOutcome> {
        let mut latest_oracle = self.state.oracle.lock().await;
        let round = record.round;

        if !self.is_successor(*latest_oracle, round) {
            info!(
                latest_oracle_round = *latest_oracle,
                round, "Skipping irrelevant round"
            );
            return Ok(RoundOutcome::Skipped);
        }

        let timestamp = self.chain_info.round_timestamp(round);
        info!(
            round,
            timestamp,
            time = ?self.chain_info.round_datetime(round),
            randomness = %record.randomness,
            signature = %record.signature,
            "Processing round"
        );

        let auth_signature = self
            .signer
            .sign_set_randomness(round, timestamp, record.randomness, record.signature.clone())
            .await
            .map_err(|e| {
                error!(round, error = %e, "Failed to sign set randomness");
                e
            })?;

        let gas_price = self.rpc.suggest_gas_price().await.map_err(|e| {
            error!(round, error = %e, "Failed to get suggested gas price");
            e
        })?;

        let options = self
            .sender
            .submit_options(self.params.set_randomness_gas_limit, gas_price);
        let update = RandomnessUpdate {
            round,
            timestamp,
            randomness: record.randomness,
            signature: record.signature.clone(),
        };
        let tx_hash = self
            .oracle
            .set_randomness(options, update, auth_signature)
            .await
            .map_err(|e| {
                error!(round, error = %e, "Failed to submit set randomness");
                e
            })?;
        debug!(round, %tx_hash, gas_price, "Submitted set randomness transaction");

        let receipt = match self.confirm(round, tx_hash).await {
            Ok(receipt) => receipt,
            Err(e @ UpdaterError::Timeout { .. }) => {
                return self.reconcile(&mut latest_oracle, round, e).await;
            }
            Err(e) => return Err(e),
        };
        if !receipt.success {
            self.metrics.inc_set_randomness_failure();
            warn!(
                round,
                %tx_hash,
                block_number = ?receipt.block_number,
                "Set randomness transaction failed"
            );
            let failure = UpdaterError::TransactionFailed { round, tx_hash };
            return self.reconcile(&mut latest_oracle, round, failure).await;
        }

        *latest_oracle = round;
        self.metrics.set_oracle_round(round);
        self.metrics.inc_set_randomness_success();
        info!(
            round,
            %tx_hash,
            block_number = ?receipt.block_number,
            "Set randomness transaction successful"
        );
        Ok(RoundOutcome::Committed { tx_hash })
    }

    /// Re-read the oracle after a submission that did not confirm.
    ///
    /// An earlier transaction for `round` may have mined late, in which case
    /// every resubmission reverts. If the contract already holds `round`, the
    /// cursor adopts the on-chain value; otherwise `failure` is returned.
    async fn reconcile(
        &self,
        latest_oracle: &mut RoundNumber,
        round: RoundNumber,
        failure: UpdaterError,
    ) -> UpdaterResult<RoundOutcome> {
        let on_chain = match self.oracle.latest_round().await {
            Ok(on_chain) => on_chain,
            Err(e) => {
                warn!(round, error = %e, "Failed to read oracle latest round after failed submission");
                return Err(failure);
            }
        };
        if on_chain < round {
            return Err(failure);
        }

        *latest_oracle = on_chain;
        self.metrics.set_oracle_round(on_chain);
        info!(
            round,
            latest_oracle_round = on_chain,
            error = %failure,
            "Round already recorded on-chain"
        );
        Ok(RoundOutcome::AlreadyCommitted {
            latest_oracle_round: on_chain,
        })
    }

    async fn confirm(&self, round: RoundNumber, tx_hash: TxHash) -> UpdaterResult<MinedReceipt> {
        let wait = self.rpc.wait_mined(tx_hash);
        let receipt = match self.params.confirmation_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, wait).await {
                Ok(receipt) => receipt,
                Err(_) => {
                    error!(round, %tx_hash, ?timeout, "Timed out waiting for transaction to be mined");
                    return Err(UpdaterError::Timeout {
                        operation: "transaction confirmation",
                        timeout,
                    });
                }
            },
            None => wait.await,
        };
        receipt.map_err(|e| {
            error!(round, %tx_hash, error = %e, "Failed to wait for transaction to be mined");
            UpdaterError::from(e)
        })
    }
}
