//! Harvest of locked-liquidity fee rewards.

use cpmm_domain::enums::PoolSortBy;
use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_protocols::raydium::instructions as ix;
use cpmm_protocols::raydium::state::PoolSide;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use tracing::info;

use super::to_raw;
use crate::context::ClientContext;
use crate::transaction::OperationResult;

const OP: &str = "harvest_lock";

/// Parameters for harvesting a locked position's fees.
#[derive(Debug, Clone)]
pub struct HarvestLockParams {
    /// Explicit pool id; the cluster default is used when absent.
    pub pool_id: Option<Pubkey>,
    /// The lock receipt: the fee NFT minted when the position was locked.
    pub fee_nft_mint: Pubkey,
    /// LP-denominated fee amount to claim; everything accrued when absent.
    pub fee_amount: Option<Decimal>,
}

/// Outcome of a fee harvest.
#[derive(Debug, Clone)]
pub struct HarvestLockResult {
    pub result: OperationResult,
    pub fee_nft_mint: Pubkey,
    /// LP-denominated amount requested, raw units.
    pub fee_lp_amount: u64,
}

pub async fn run(
    ctx: &ClientContext,
    params: HarvestLockParams,
) -> Result<HarvestLockResult, OperationError> {
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

    let fee_lp_amount = match params.fee_amount {
        Some(amount) => to_raw(OP, amount, pool.lp_decimals)?,
        // The program caps the claim at what has actually accrued.
        None => u64::MAX,
    };

    let owner = signer.pubkey();
    let mut instructions = vec![
        ix::create_ata_idempotent(&owner, &owner, &pool.token_a.mint, &pool.token_a.program),
        ix::create_ata_idempotent(&owner, &owner, &pool.token_b.mint, &pool.token_b.program),
    ];
    instructions.push(ctx.instructions().collect_locked_fees(
        &pool,
        &owner,
        &params.fee_nft_mint,
        fee_lp_amount,
    ));
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

    info!(
        pool = %pool.id,
        fee_nft_mint = %params.fee_nft_mint,
        fee_lp_amount,
        "Harvesting locked-liquidity fees"
    );

    let priority_fee = ctx.priority_fee(&instructions).await;
    let result = ctx
        .executor()
        .execute(OP, instructions, signer, &[], pool.id, priority_fee)
        .await?;

    Ok(HarvestLockResult {
        result,
        fee_nft_mint: params.fee_nft_mint,
        fee_lp_amount,
    })
}
