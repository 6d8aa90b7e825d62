//! On-chain protocol plumbing for constant-product AMM pools.
//!
//! This crate owns everything that talks to the chain or the off-chain
//! pool index:
//! - RPC provider over the nonblocking Solana client
//! - CP-Swap account layouts, PDAs and instruction builders
//! - Off-chain index client and the pool locator

/// RPC provider and token balance reads.
pub mod rpc;

/// CP-Swap protocol: layouts, PDAs, instructions, index client, locator.
pub mod raydium;

use async_trait::async_trait;
use cpmm_domain::error::OperationError;
use solana_sdk::pubkey::Pubkey;

use raydium::state::PoolState;

/// Seam for pool-state resolution, so orchestration can run against a
/// test double.
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Fetches a pool snapshot. `live_reserves` additionally pulls the
    /// instantaneous reserve and fee-rate data that swap math requires.
    async fn pool_state(
        &self,
        pool_id: &Pubkey,
        live_reserves: bool,
    ) -> Result<PoolState, OperationError>;
}
