//! CP-Swap constant-product pools.
//!
//! - Account layouts and decoders
//! - Program-derived addresses
//! - Instruction builders
//! - Off-chain index client
//! - Pool locator

pub mod api;
pub mod instructions;
pub mod layout;
pub mod locator;
pub mod pda;
pub mod state;

pub use locator::PoolLocator;
pub use state::{FeeConfig, PoolSide, PoolState, TokenInfo};
