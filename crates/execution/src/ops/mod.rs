//! Operation orchestrators.
//!
//! Every operation follows the same template: validate parameters
//! synchronously, resolve pool and config state, compute amounts, assemble
//! the instruction sequence, delegate to the transaction executor, and
//! return an operation-specific result around the shared
//! [`OperationResult`](crate::transaction::OperationResult).

pub mod add_liquidity;
pub mod create_pool;
pub mod harvest;
pub mod lock;
pub mod remove_liquidity;
pub mod swap;

pub use add_liquidity::{AddLiquidityParams, AddLiquidityResult};
pub use create_pool::{CreatePoolParams, CreatePoolResult};
pub use harvest::{HarvestLockParams, HarvestLockResult};
pub use lock::{LockLiquidityParams, LockLiquidityResult};
pub use remove_liquidity::{RemoveLiquidityParams, RemoveLiquidityResult};
pub use swap::{SwapExactInParams, SwapExactOutParams, SwapResult};

use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_domain::math::CurveError;
use cpmm_domain::value_objects::Amount;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;

use crate::context::ClientContext;

/// Converts a positive human-readable amount to raw units, rejecting
/// non-positive or unrepresentable values before any network call.
pub(crate) fn to_raw(
    operation: &'static str,
    amount: Decimal,
    decimals: u8,
) -> Result<u64, OperationError> {
    ensure_positive(operation, amount)?;
    let raw = Amount::from_decimal(amount, decimals)
        .ok_or_else(|| {
            OperationError::new(
                operation,
                ErrorCode::InvalidAmount,
                format!("amount {amount} is not representable with {decimals} decimals"),
            )
        })?
        .raw;
    if raw == 0 {
        return Err(OperationError::new(
            operation,
            ErrorCode::InvalidAmount,
            format!("amount {amount} rounds to zero raw units"),
        ));
    }
    Ok(raw)
}

pub(crate) fn ensure_positive(
    operation: &'static str,
    amount: Decimal,
) -> Result<(), OperationError> {
    if amount <= Decimal::ZERO {
        return Err(OperationError::new(
            operation,
            ErrorCode::InvalidAmount,
            format!("amount must be positive, got {amount}"),
        ));
    }
    Ok(())
}

/// Maps a pure curve failure into the operation error vocabulary.
pub(crate) fn curve_err(operation: &'static str, error: CurveError) -> OperationError {
    let code = match error {
        CurveError::InvalidReserve => ErrorCode::InvalidReserve,
        CurveError::InsufficientLiquidity => ErrorCode::InsufficientLiquidity,
        CurveError::InvalidSlippage => ErrorCode::InvalidSlippageRange,
        CurveError::InvalidFeeRate => ErrorCode::InvalidPoolType,
        CurveError::Overflow => ErrorCode::MathOverflow,
    };
    OperationError::new(operation, code, error.to_string())
}

/// The caller's LP balance for a pool, zero when the account is absent.
pub(crate) async fn lp_balance(
    ctx: &ClientContext,
    operation: &'static str,
    pool: &cpmm_protocols::raydium::state::PoolState,
    owner: &Pubkey,
) -> Result<u64, OperationError> {
    let lp_account = ctx.instructions().lp_token_account(pool, owner);
    let balance = ctx
        .provider()
        .token_balance(&lp_account)
        .await
        .map_err(|e| {
            OperationError::new(operation, ErrorCode::NoLpBalance, "LP balance lookup failed")
                .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
        })?;
    Ok(balance.map(|b| b.amount).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn raw_conversion_checks_sign_and_magnitude() {
        assert_eq!(to_raw("t", dec!(1.5), 6).unwrap(), 1_500_000);
        assert_eq!(
            to_raw("t", dec!(0), 6).unwrap_err().code,
            ErrorCode::InvalidAmount
        );
        assert_eq!(
            to_raw("t", dec!(-3), 6).unwrap_err().code,
            ErrorCode::InvalidAmount
        );
        // Positive but below one raw unit.
        assert_eq!(
            to_raw("t", dec!(0.0000001), 6).unwrap_err().code,
            ErrorCode::InvalidAmount
        );
    }

    #[test]
    fn curve_errors_map_to_operation_codes() {
        assert_eq!(
            curve_err("t", CurveError::InsufficientLiquidity).code,
            ErrorCode::InsufficientLiquidity
        );
        assert_eq!(
            curve_err("t", CurveError::Overflow).code,
            ErrorCode::MathOverflow
        );
        assert_eq!(
            curve_err("t", CurveError::InvalidReserve).code,
            ErrorCode::InvalidReserve
        );
    }
}
