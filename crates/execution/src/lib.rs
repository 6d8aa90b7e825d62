//! Operation orchestration and transaction execution.
//!
//! This crate wires the domain math and protocol plumbing into the seven
//! pool operations:
//! - Client context construction and signer handling
//! - Fee config caching with a TTL
//! - Pool/swap/liquidity orchestrators
//! - Transaction signing and submission
//! - Connection health monitoring with bounded backoff
//! - Priority fee estimation
//! - Bounded-concurrency task batches

/// Prelude module for convenient imports.
pub mod prelude;

/// Bounded-concurrency task batches.
pub mod batch;
/// Fee config cache.
pub mod config_cache;
/// Connection health state machine.
pub mod connection;
/// Client context.
pub mod context;
/// Priority fee estimation.
pub mod fees;
/// Operation orchestrators.
pub mod ops;
/// Transaction signing and submission.
pub mod transaction;
