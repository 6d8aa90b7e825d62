//! Two-sided liquidity deposit.

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

use super::{curve_err, ensure_positive, to_raw};
use crate::context::ClientContext;
use crate::transaction::OperationResult;

const OP: &str = "add_liquidity";

/// Parameters for a liquidity deposit.
#[derive(Debug, Clone)]
pub struct AddLiquidityParams {
    /// Explicit pool id; wins over the mint pair.
    pub pool_id: Option<Pubkey>,
    /// Mint pair for pool search when no id is given.
    pub mint_a: Option<Pubkey>,
    pub mint_b: Option<Pubkey>,
    /// Human-readable amount of the authoritative side.
    pub input_amount: Decimal,
    /// Slippage tolerance in basis points, bounding the derived side.
    pub slippage_bps: u32,
    /// Whether the base (token 0) side is authoritative.
    pub base_in: bool,
    /// Pick the best pool by criterion instead of the first match.
    pub auto_select_best_pool: bool,
    pub pool_sort_by: PoolSortBy,
}

/// Outcome of a liquidity deposit.
#[derive(Debug, Clone)]
pub struct AddLiquidityResult {
    pub result: OperationResult,
    /// LP tokens requested, after slippage on the pro-rata expectation.
    pub lp_amount: u64,
    /// Raw amount supplied on the authoritative side.
    pub input_amount: u64,
    /// Derived pair amount on the other side.
    pub pair_amount: u64,
    /// Maximum the caller is willing to supply on the other side.
    pub pair_amount_limit: u64,
    pub base_in: bool,
}

pub async fn run(
    ctx: &ClientContext,
    params: AddLiquidityParams,
) -> Result<AddLiquidityResult, OperationError> {
    let signer = ctx.signer_or_err(OP)?;
    let slippage = Slippage::from_bps(params.slippage_bps).map_err(|e| e.in_operation(OP))?;
    ensure_positive(OP, params.input_amount)?;

    let pool_id = ctx
        .locator()
        .resolve_pool_id(
            params.pool_id,
            params.mint_a,
            params.mint_b,
            params.auto_select_best_pool,
            params.pool_sort_by,
        )
        .await
        .map_err(|e| e.in_operation(OP))?;
    let pool = ctx
        .locator()
        .fetch_pool_state(&pool_id, false)
        .await
        .map_err(|e| e.in_operation(OP))?;

    if pool.lp_supply == 0 {
        return Err(OperationError::new(
            OP,
            ErrorCode::InvalidReserve,
            format!("pool {pool_id} reports no LP supply"),
        ));
    }

    let auth_side = if params.base_in {
        PoolSide::A
    } else {
        PoolSide::B
    };
    let other_side = auth_side.other();

    let input_amount = to_raw(OP, params.input_amount, pool.token(auth_side).decimals)?;

    // The other side follows the reserve ratio; slippage bounds how much
    // more than the snapshot ratio the caller will tolerate supplying.
    let amounts = math::compute_liquidity_amounts(
        input_amount,
        pool.reserve(auth_side),
        pool.reserve(other_side),
        slippage.bps(),
        SlippageDirection::Ceiling,
    )
    .map_err(|e| curve_err(OP, e))?;

    let expected_lp = math::pro_rata_floor(input_amount, pool.lp_supply, pool.reserve(auth_side))
        .map_err(|e| curve_err(OP, e))?;
    let lp_amount = math::apply_slippage(expected_lp, slippage.bps(), SlippageDirection::Floor)
        .map_err(|e| curve_err(OP, e))?;

    let (maximum_token_0_amount, maximum_token_1_amount) = match auth_side {
        PoolSide::A => (input_amount, amounts.pair_amount_limit),
        PoolSide::B => (amounts.pair_amount_limit, input_amount),
    };

    info!(
        pool = %pool.id,
        input_amount,
        pair_amount = amounts.pair_amount,
        lp_amount,
        base_in = params.base_in,
        "Adding liquidity"
    );

    let owner = signer.pubkey();
    let mut instructions = vec![ix::create_ata_idempotent(
        &owner,
        &owner,
        &pool.lp_mint,
        &spl_token::id(),
    )];
    for (side, amount) in [
        (PoolSide::A, maximum_token_0_amount),
        (PoolSide::B, maximum_token_1_amount),
    ] {
        if ix::is_native_mint(&pool.token(side).mint) {
            let (_, wrap) = ix::wrap_native(&owner, amount).map_err(wrap_err)?;
            instructions.extend(wrap);
        }
    }
    instructions.push(ctx.instructions().deposit(
        &pool,
        &owner,
        lp_amount,
        maximum_token_0_amount,
        maximum_token_1_amount,
    ));

    let priority_fee = ctx.priority_fee(&instructions).await;
    let result = ctx
        .executor()
        .execute(OP, instructions, signer, &[], pool.id, priority_fee)
        .await?;

    Ok(AddLiquidityResult {
        result,
        lp_amount,
        input_amount,
        pair_amount: amounts.pair_amount,
        pair_amount_limit: amounts.pair_amount_limit,
        base_in: params.base_in,
    })
}

fn wrap_err(e: anyhow::Error) -> OperationError {
    OperationError::new(
        OP,
        ErrorCode::TransactionExecutionFailed,
        "failed to build wrap instructions",
    )
    .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
}
