//! Liquidity locking.

use cpmm_domain::enums::PoolSortBy;
use cpmm_domain::error::{ErrorCode, OperationError};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tracing::info;

use super::{lp_balance, to_raw};
use crate::context::ClientContext;
use crate::transaction::OperationResult;

const OP: &str = "lock_liquidity";

/// Parameters for locking LP tokens.
#[derive(Debug, Clone)]
pub struct LockLiquidityParams {
    /// Explicit pool id; the cluster default is used when absent.
    pub pool_id: Option<Pubkey>,
    /// LP amount to lock; the caller's full balance when absent.
    pub lp_amount: Option<Decimal>,
}

/// Outcome of a liquidity lock.
#[derive(Debug, Clone)]
pub struct LockLiquidityResult {
    pub result: OperationResult,
    /// LP tokens locked, raw units.
    pub lp_locked: u64,
    /// Mint of the fee NFT; its holder can harvest accrued fees.
    pub fee_nft_mint: Pubkey,
}

pub async fn run(
    ctx: &ClientContext,
    params: LockLiquidityParams,
) -> Result<LockLiquidityResult, OperationError> {
    let signer = ctx.signer_or_err(OP)?;

    let pool_id = ctx
        .locator()
        .resolve_pool_id(params.pool_id, None, None, false, PoolSortBy::default())
        .await
        .map_err(|e| e.in_operation(OP))?;
    let pool = ctx
        .locator()
        .fetch_pool_state(&pool_id, false)
        .await
        .map_err(|e| e.in_operation(OP))?;

    let owner = signer.pubkey();
    let balance = lp_balance(ctx, OP, &pool, &owner).await?;
    if balance == 0 {
        return Err(OperationError::new(
            OP,
            ErrorCode::NoLpBalance,
            format!("no LP tokens held for pool {pool_id}"),
        ));
    }

    let lp_locked = match params.lp_amount {
        Some(amount) => {
            let requested = to_raw(OP, amount, pool.lp_decimals)?;
            if requested > balance {
                return Err(OperationError::new(
                    OP,
                    ErrorCode::InsufficientLpBalance,
                    format!("requested {requested} LP but only {balance} held"),
                ));
            }
            requested
        }
        None => balance,
    };

    // The fee NFT mint is an ephemeral keypair that must co-sign.
    let fee_nft_mint = Keypair::new();
    let lock_ix =
        ctx.instructions()
            .lock_liquidity(&pool, &owner, &fee_nft_mint.pubkey(), lp_locked);

    info!(
        pool = %pool.id,
        lp_locked,
        fee_nft_mint = %fee_nft_mint.pubkey(),
        "Locking liquidity"
    );

    let instructions = vec![lock_ix];
    let priority_fee = ctx.priority_fee(&instructions).await;
    let result = ctx
        .executor()
        .execute(
            OP,
            instructions,
            signer,
            &[&fee_nft_mint],
            pool.id,
            priority_fee,
        )
        .await?;

    Ok(LockLiquidityResult {
        result,
        lp_locked,
        fee_nft_mint: fee_nft_mint.pubkey(),
    })
}
