//! drand oracle updater.
//!
//! Wires the production collaborators into the relay engine:
//! - drand HTTP beacon
//! - JSON-RPC oracle binding and chain RPC
//! - EIP-712 authorization signer and paying sender
//! - Prometheus metrics endpoint

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
