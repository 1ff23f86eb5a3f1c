//! drand beacon access for the oracle updater.
//!
//! Provides:
//! - `BeaconSource`: dyn-compatible trait consumed by the relay engine
//! - `HttpBeacon`: drand HTTP API client (info, rounds, latest)
//! - `PollingWatcher`: gap-free feed of newly published rounds

pub mod client;
pub mod error;
pub mod source;
pub mod watch;

pub use client::{BeaconConfig, HttpBeacon};
pub use error::{BeaconError, BeaconResult};
pub use source::{BeaconSource, BoxFuture, DynBeaconSource, LATEST_ROUND};
pub use watch::PollingWatcher;
