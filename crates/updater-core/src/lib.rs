//! Core domain types for the drand oracle updater.
//!
//! This crate provides the values shared by every component of the relay:
//! - `RoundRecord`: one beacon round (round number, randomness, signature)
//! - `ChainInfo`: immutable beacon chain metadata (genesis, period, hash)
//! - `RoundNumber`: alias used for beacon and oracle cursors

pub mod chain_info;
pub mod error;
pub mod round;

pub use chain_info::ChainInfo;
pub use error::{CoreError, Result};
pub use round::{RoundNumber, RoundRecord};
