//! Single-slot round queue.
//!
//! Both drivers push into one bounded channel of capacity 1 and the round
//! processor is its only consumer, so at most one record is ever waiting
//! between production and consumption. Push and pop both observe
//! cancellation.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use updater_core::RoundRecord;

/// Queue capacity.
pub const QUEUE_CAPACITY: usize = 1;

/// Result of a blocking push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// Cancelled while waiting for the slot.
    Cancelled,
    /// The processor is gone.
    Closed,
}

/// Producer half, cloned into each driver.
#[derive(Debug, Clone)]
pub struct RoundSender {
    tx: mpsc::Sender<RoundRecord>,
}

/// Consumer half, owned by the round processor.
#[derive(Debug)]
pub struct RoundReceiver {
    rx: mpsc::Receiver<RoundRecord>,
}

/// Create the single-slot queue.
pub fn round_queue() -> (RoundSender, RoundReceiver) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (RoundSender { tx }, RoundReceiver { rx })
}

impl RoundSender {
    /// Push a record, waiting until the slot is free.
    pub async fn push(&self, record: RoundRecord, cancel: &CancellationToken) -> PushOutcome {
        tokio::select! {
            biased;
            () = cancel.cancelled() => PushOutcome::Cancelled,
            sent = self.tx.send(record) => match sent {
                Ok(()) => PushOutcome::Delivered,
                Err(_) => PushOutcome::Closed,
            },
        }
    }
}

impl RoundReceiver {
    /// Pop the next record. `None` on cancellation or when every sender is gone.
    pub async fn pop(&mut self, cancel: &CancellationToken) -> Option<RoundRecord> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            record = self.rx.recv() => record,
        }
    }

    /// Take a waiting record without blocking.
    pub fn try_pop(&mut self) -> Option<RoundRecord> {
        self.rx.try_recv().ok()
    }
}
