//! Exact-in and exact-out swaps.

use cpmm_domain::enums::{PoolSortBy, SlippageDirection, TradeDirection};
use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_domain::math;
use cpmm_domain::value_objects::Slippage;
use cpmm_protocols::raydium::instructions as ix;
use cpmm_protocols::raydium::state::{PoolSide, PoolState};
use rust_decimal::Decimal;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use tracing::info;

use super::{curve_err, ensure_positive, to_raw};
use crate::context::ClientContext;
use crate::transaction::OperationResult;

/// Parameters for an exact-input swap.
#[derive(Debug, Clone)]
pub struct SwapExactInParams {
    /// Explicit pool; the cluster default is used when absent.
    pub pool_id: Option<Pubkey>,
    /// Mint being sold.
    pub input_mint: Pubkey,
    /// Human-readable input amount.
    pub amount_in: Decimal,
    /// Slippage tolerance in basis points.
    pub slippage_bps: u32,
    /// Explicit direction override; inferred from the mint when absent.
    pub base_in: Option<bool>,
}

/// Parameters for an exact-output swap.
#[derive(Debug, Clone)]
pub struct SwapExactOutParams {
    pub pool_id: Option<Pubkey>,
    /// Mint being bought.
    pub output_mint: Pubkey,
    /// Human-readable output amount.
    pub amount_out: Decimal,
    pub slippage_bps: u32,
    pub base_in: Option<bool>,
}

/// Outcome of either swap operation.
#[derive(Debug, Clone)]
pub struct SwapResult {
    pub result: OperationResult,
    pub direction: TradeDirection,
    /// Raw input amount (quoted for exact-out).
    pub amount_in: u64,
    /// Raw output amount (quoted for exact-in).
    pub amount_out: u64,
    /// Trade fee charged on the input side, raw units.
    pub trade_fee: u64,
    /// Minimum output (exact-in) or maximum input (exact-out) enforced
    /// on-chain.
    pub limit_amount: u64,
}

const OP_IN: &str = "swap_exact_in";
const OP_OUT: &str = "swap_exact_out";

pub async fn exact_in(
    ctx: &ClientContext,
    params: SwapExactInParams,
) -> Result<SwapResult, OperationError> {
    let signer = ctx.signer_or_err(OP_IN)?;
    let slippage = Slippage::from_bps(params.slippage_bps).map_err(|e| e.in_operation(OP_IN))?;
    ensure_positive(OP_IN, params.amount_in)?;

    let pool = resolve_pool(ctx, OP_IN, params.pool_id).await?;
    let input_side = swap_side(&pool, &params.input_mint, params.base_in, OP_IN, true)?;
    let output_side = input_side.other();

    let amount_in = to_raw(OP_IN, params.amount_in, pool.token(input_side).decimals)?;
    let quote = math::swap_exact_in(
        amount_in,
        pool.reserve(input_side),
        pool.reserve(output_side),
        pool.trade_fee_bps,
    )
    .map_err(|e| curve_err(OP_IN, e))?;
    let minimum_amount_out =
        math::apply_slippage(quote.amount_out, slippage.bps(), SlippageDirection::Floor)
            .map_err(|e| curve_err(OP_IN, e))?;

    info!(
        pool = %pool.id,
        amount_in,
        quoted_out = quote.amount_out,
        minimum_amount_out,
        "Swapping exact input"
    );

    let owner = signer.pubkey();
    let swap_ix = ctx.instructions().swap_base_input(
        &pool,
        &owner,
        input_side,
        amount_in,
        minimum_amount_out,
    );
    let instructions = surround_swap(ctx, &pool, &owner, input_side, amount_in, swap_ix)
        .map_err(|e| e.in_operation(OP_IN))?;

    let priority_fee = ctx.priority_fee(&instructions).await;
    let result = ctx
        .executor()
        .execute(OP_IN, instructions, signer, &[], pool.id, priority_fee)
        .await?;

    Ok(SwapResult {
        result,
        direction: direction_of(input_side),
        amount_in,
        amount_out: quote.amount_out,
        trade_fee: quote.trade_fee,
        limit_amount: minimum_amount_out,
    })
}

pub async fn exact_out(
    ctx: &ClientContext,
    params: SwapExactOutParams,
) -> Result<SwapResult, OperationError> {
    let signer = ctx.signer_or_err(OP_OUT)?;
    let slippage = Slippage::from_bps(params.slippage_bps).map_err(|e| e.in_operation(OP_OUT))?;
    ensure_positive(OP_OUT, params.amount_out)?;

    let pool = resolve_pool(ctx, OP_OUT, params.pool_id).await?;
    let output_side = swap_side(&pool, &params.output_mint, params.base_in.map(|b| !b), OP_OUT, false)?;
    let input_side = output_side.other();

    let amount_out = to_raw(OP_OUT, params.amount_out, pool.token(output_side).decimals)?;
    let quote = math::swap_exact_out(
        amount_out,
        pool.reserve(input_side),
        pool.reserve(output_side),
        pool.trade_fee_bps,
    )
    .map_err(|e| curve_err(OP_OUT, e))?;
    let maximum_amount_in =
        math::apply_slippage(quote.amount_in, slippage.bps(), SlippageDirection::Ceiling)
            .map_err(|e| curve_err(OP_OUT, e))?;

    info!(
        pool = %pool.id,
        amount_out,
        quoted_in = quote.amount_in,
        maximum_amount_in,
        "Swapping exact output"
    );

    let owner = signer.pubkey();
    let swap_ix = ctx.instructions().swap_base_output(
        &pool,
        &owner,
        input_side,
        maximum_amount_in,
        amount_out,
    );
    let instructions = surround_swap(ctx, &pool, &owner, input_side, maximum_amount_in, swap_ix)
        .map_err(|e| e.in_operation(OP_OUT))?;

    let priority_fee = ctx.priority_fee(&instructions).await;
    let result = ctx
        .executor()
        .execute(OP_OUT, instructions, signer, &[], pool.id, priority_fee)
        .await?;

    Ok(SwapResult {
        result,
        direction: direction_of(input_side),
        amount_in: quote.amount_in,
        amount_out,
        trade_fee: quote.trade_fee,
        limit_amount: maximum_amount_in,
    })
}

async fn resolve_pool(
    ctx: &ClientContext,
    operation: &'static str,
    pool_id: Option<Pubkey>,
) -> Result<PoolState, OperationError> {
    let pool_id = ctx
        .locator()
        .resolve_pool_id(pool_id, None, None, false, PoolSortBy::default())
        .await
        .map_err(|e| e.in_operation(operation))?;
    // Swap math needs live reserves and fee rate, captured together.
    ctx.locator()
        .fetch_pool_state(&pool_id, true)
        .await
        .map_err(|e| e.in_operation(operation))
}

/// Determines which side the given mint trades from. The `base_in`
/// override wins when supplied; either way the mint must belong to the
/// pool.
fn swap_side(
    pool: &PoolState,
    mint: &Pubkey,
    base_in: Option<bool>,
    operation: &'static str,
    is_input: bool,
) -> Result<PoolSide, OperationError> {
    let side = pool.side_of(mint).ok_or_else(|| {
        let (code, label) = if is_input {
            (ErrorCode::InvalidInputMint, "input")
        } else {
            (ErrorCode::InvalidOutputMint, "output")
        };
        OperationError::new(
            operation,
            code,
            format!("{label} mint {mint} does not belong to pool {}", pool.id),
        )
    })?;
    Ok(match base_in {
        Some(true) => PoolSide::A,
        Some(false) => PoolSide::B,
        None => side,
    })
}

fn direction_of(input_side: PoolSide) -> TradeDirection {
    match input_side {
        PoolSide::A => TradeDirection::BaseIn,
        PoolSide::B => TradeDirection::QuoteIn,
    }
}

/// Wraps the swap instruction with account preparation and native-SOL
/// handling: output ATA creation, input wrapping before the swap, output
/// unwrapping after it.
fn surround_swap(
    ctx: &ClientContext,
    pool: &PoolState,
    owner: &Pubkey,
    input_side: PoolSide,
    input_amount: u64,
    swap_ix: Instruction,
) -> Result<Vec<Instruction>, OperationError> {
    let output_side = input_side.other();
    let input_token = pool.token(input_side);
    let output_token = pool.token(output_side);

    let mut instructions = Vec::new();
    instructions.push(ix::create_ata_idempotent(
        owner,
        owner,
        &output_token.mint,
        &output_token.program,
    ));

    if ix::is_native_mint(&input_token.mint) {
        let (_, wrap) = ix::wrap_native(owner, input_amount).map_err(|e| {
            OperationError::new(
                "swap",
                ErrorCode::TransactionExecutionFailed,
                "failed to build wrap instructions",
            )
            .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
        })?;
        instructions.extend(wrap);
    }

    instructions.push(swap_ix);

    if ix::is_native_mint(&output_token.mint) {
        let wsol_account = ctx.instructions().user_token_account(pool, owner, output_side);
        instructions.push(ix::close_token_account(owner, &wsol_account).map_err(|e| {
            OperationError::new(
                "swap",
                ErrorCode::TransactionExecutionFailed,
                "failed to build unwrap instruction",
            )
            .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
        })?);
    }

    Ok(instructions)
}
