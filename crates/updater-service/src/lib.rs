//! Round-relay engine of the drand oracle updater.
//!
//! Architecture:
//! ```text
//! Bootstrap ──► SharedState { BeaconCursor, OracleCursor }
//!                   │
//!   Backfill ──┐    │
//!              ├──► RoundQueue (1 slot) ──► RoundProcessor ──► oracle
//!   LiveFeed ──┘
//!
//!   BalanceMonitor (independent)
//! ```
//!
//! `Updater` runs bootstrap first, then the four drivers under one
//! cancellation scope. The first driver failure cancels the rest and is
//! returned to the caller.

pub mod backfill;
pub mod balance;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod processor;
pub mod queue;
pub mod state;
pub mod updater;
pub mod watch;

pub use backfill::Backfill;
pub use balance::BalanceMonitor;
pub use bootstrap::{bootstrap, BootstrapReport};
pub use config::UpdaterParams;
pub use error::{UpdaterError, UpdaterResult};
pub use processor::{RoundOutcome, RoundProcessor};
pub use queue::{round_queue, PushOutcome, RoundReceiver, RoundSender};
pub use state::{BeaconCursor, OracleCursor, SharedState};
pub use updater::{Collaborators, Updater};
pub use watch::LiveFeed;
