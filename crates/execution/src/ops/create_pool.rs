//! Pool creation.

use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_protocols::raydium::instructions::{self as ix, InitializePoolParams};
use cpmm_protocols::raydium::pda;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use tracing::info;

use super::{ensure_positive, to_raw};
use crate::context::ClientContext;
use crate::transaction::OperationResult;

const OP: &str = "create_pool";

/// Parameters for creating a pool.
#[derive(Debug, Clone)]
pub struct CreatePoolParams {
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    /// Human-readable initial deposit for `mint_a`.
    pub amount_a: Decimal,
    /// Human-readable initial deposit for `mint_b`.
    pub amount_b: Decimal,
    /// Unix timestamp trading opens; immediately when absent.
    pub start_time: Option<u64>,
    /// Fee config tier index; tier 0 when absent.
    pub fee_config_index: Option<usize>,
}

/// Outcome of pool creation.
#[derive(Debug, Clone)]
pub struct CreatePoolResult {
    pub result: OperationResult,
    /// The created pool's address.
    pub pool_id: Pubkey,
    pub lp_mint: Pubkey,
    /// Raw initial deposit of token 0.
    pub init_amount_0: u64,
    /// Raw initial deposit of token 1.
    pub init_amount_1: u64,
    /// Index of the fee config tier used.
    pub fee_config_index: usize,
}

pub async fn run(
    ctx: &ClientContext,
    params: CreatePoolParams,
) -> Result<CreatePoolResult, OperationError> {
    let signer = ctx.signer_or_err(OP)?;
    if params.mint_a == params.mint_b {
        return Err(OperationError::new(
            OP,
            ErrorCode::InvalidMintAddresses,
            "pool mints must be distinct",
        ));
    }
    ensure_positive(OP, params.amount_a)?;
    ensure_positive(OP, params.amount_b)?;

    let configs = ctx.fee_configs().await.map_err(|e| e.in_operation(OP))?;
    let fee_config_index = params.fee_config_index.unwrap_or(0);
    let config = configs.get(fee_config_index).ok_or_else(|| {
        OperationError::new(
            OP,
            ErrorCode::InvalidFeeConfigIndex,
            format!(
                "fee config index {fee_config_index} outside [0, {})",
                configs.len()
            ),
        )
    })?;

    // Both mint descriptors fetched concurrently; either failure aborts.
    let (info_a, info_b) = tokio::try_join!(
        ctx.provider().mint_info(&params.mint_a),
        ctx.provider().mint_info(&params.mint_b),
    )
    .map_err(|e| {
        OperationError::new(OP, ErrorCode::InvalidMintAddresses, "mint lookup failed")
            .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
    })?;

    // The program requires the byte-wise smaller mint as token 0.
    let (mint_0, mint_1) = pda::order_mints(params.mint_a, params.mint_b);
    let ((info_0, amount_0), (info_1, amount_1)) = if mint_0 == params.mint_a {
        ((info_a, params.amount_a), (info_b, params.amount_b))
    } else {
        ((info_b, params.amount_b), (info_a, params.amount_a))
    };

    let init_amount_0 = to_raw(OP, amount_0, info_0.decimals)?;
    let init_amount_1 = to_raw(OP, amount_1, info_1.decimals)?;
    let open_time = params.start_time.unwrap_or(0);

    let owner = signer.pubkey();
    let mut instructions = Vec::new();
    for (mint, mint_info, amount) in [
        (mint_0, info_0, init_amount_0),
        (mint_1, info_1, init_amount_1),
    ] {
        if ix::is_native_mint(&mint) {
            // The initialize instruction pulls from the creator's wrapped
            // account, so the native side is wrapped first.
            let (_, wrap) = ix::wrap_native(&owner, amount).map_err(|e| {
                OperationError::new(
                    OP,
                    ErrorCode::TransactionExecutionFailed,
                    "failed to build wrap instructions",
                )
                .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
            })?;
            instructions.extend(wrap);
        } else {
            instructions.push(ix::create_ata_idempotent(
                &owner,
                &owner,
                &mint,
                &mint_info.program,
            ));
        }
    }

    let init_params = InitializePoolParams {
        amm_config: config.id,
        mint_0,
        mint_1,
        mint_0_program: info_0.program,
        mint_1_program: info_1.program,
        init_amount_0,
        init_amount_1,
        open_time,
    };
    instructions.push(ctx.instructions().initialize(&owner, &init_params));

    let amm_program = ctx.locator().amm_program();
    let pool_id = pda::pool_address(amm_program, &config.id, &mint_0, &mint_1);
    let lp_mint = pda::lp_mint_address(amm_program, &pool_id);

    info!(
        pool = %pool_id,
        mint_0 = %mint_0,
        mint_1 = %mint_1,
        init_amount_0,
        init_amount_1,
        fee_config_index,
        "Creating pool"
    );

    let priority_fee = ctx.priority_fee(&instructions).await;
    let result = ctx
        .executor()
        .execute(OP, instructions, signer, &[], pool_id, priority_fee)
        .await?;

    Ok(CreatePoolResult {
        result,
        pool_id,
        lp_mint,
        init_amount_0,
        init_amount_1,
        fee_config_index,
    })
}
