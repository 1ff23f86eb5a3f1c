//! Integration tests for the relay engine.
//!
//! These tests drive the real drivers against scripted collaborators:
//! - Bootstrap validation and cursor seeding
//! - Backfill ordering and backpressure
//! - Round processor ordering, retries and receipt handling
//! - Supervisor cancellation and error propagation

pub mod common;
