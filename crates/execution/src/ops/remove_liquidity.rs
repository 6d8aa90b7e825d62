//! Liquidity withdrawal.

use cpmm_domain::enums::{PoolSortBy, SlippageDirection};
use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_domain::math;
use cpmm_domain::value_objects::Slippage;
use cpmm_protocols::raydium::instructions as ix;
use cpmm_protocols::raydium::state::PoolSide;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use tracing::info;

use super::{curve_err, lp_balance, to_raw};
use crate::context::ClientContext;
use crate::transaction::OperationResult;

const OP: &str = "remove_liquidity";

/// Parameters for a liquidity withdrawal.
#[derive(Debug, Clone)]
pub struct RemoveLiquidityParams {
    /// Explicit pool id; the cluster default is used when absent.
    pub pool_id: Option<Pubkey>,
    /// LP amount to burn; the caller's full balance when absent.
    pub lp_amount: Option<Decimal>,
    /// Slippage tolerance in basis points, flooring both outputs.
    pub slippage_bps: u32,
}

/// Outcome of a liquidity withdrawal.
#[derive(Debug, Clone)]
pub struct RemoveLiquidityResult {
    pub result: OperationResult,
    /// LP tokens burned, raw units.
    pub lp_burned: u64,
    /// Minimum token 0 out enforced on-chain.
    pub minimum_amount_a: u64,
    /// Minimum token 1 out enforced on-chain.
    pub minimum_amount_b: u64,
}

pub async fn run(
    ctx: &ClientContext,
    params: RemoveLiquidityParams,
) -> Result<RemoveLiquidityResult, OperationError> {
    let signer = ctx.signer_or_err(OP)?;
    let slippage = Slippage::from_bps(params.slippage_bps).map_err(|e| e.in_operation(OP))?;

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

    let lp_burned = match params.lp_amount {
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

    if pool.lp_supply == 0 {
        return Err(OperationError::new(
            OP,
            ErrorCode::InvalidReserve,
            format!("pool {pool_id} reports no LP supply"),
        ));
    }
    let expected_a = math::pro_rata_floor(lp_burned, pool.reserve_a, pool.lp_supply)
        .map_err(|e| curve_err(OP, e))?;
    let expected_b = math::pro_rata_floor(lp_burned, pool.reserve_b, pool.lp_supply)
        .map_err(|e| curve_err(OP, e))?;
    let minimum_amount_a = math::apply_slippage(expected_a, slippage.bps(), SlippageDirection::Floor)
        .map_err(|e| curve_err(OP, e))?;
    let minimum_amount_b = math::apply_slippage(expected_b, slippage.bps(), SlippageDirection::Floor)
        .map_err(|e| curve_err(OP, e))?;

    info!(
        pool = %pool.id,
        lp_burned,
        minimum_amount_a,
        minimum_amount_b,
        "Removing liquidity"
    );

    let mut instructions = vec![
        ix::create_ata_idempotent(&owner, &owner, &pool.token_a.mint, &pool.token_a.program),
        ix::create_ata_idempotent(&owner, &owner, &pool.token_b.mint, &pool.token_b.program),
    ];
    instructions.push(ctx.instructions().withdraw(
        &pool,
        &owner,
        lp_burned,
        minimum_amount_a,
        minimum_amount_b,
    ));
    // Unwrap any native side back to SOL.
    for side in [PoolSide::A, PoolSide::B] {
        if ix::is_native_mint(&pool.token(side).mint) {
            let wsol_account = ctx.instructions().user_token_account(&pool, &owner, side);
            instructions.push(ix::close_token_account(&owner, &wsol_account).map_err(|e| {
                OperationError::new(
                    OP,
                    ErrorCode::TransactionExecutionFailed,
                    "failed to build unwrap instruction",
                )
                .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
            })?);
        }
    }

    let priority_fee = ctx.priority_fee(&instructions).await;
    let result = ctx
        .executor()
        .execute(OP, instructions, signer, &[], pool.id, priority_fee)
        .await?;

    Ok(RemoveLiquidityResult {
        result,
        lp_burned,
        minimum_amount_a,
        minimum_amount_b,
    })
}
