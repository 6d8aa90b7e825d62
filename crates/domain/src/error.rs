//! Structured errors shared by every operation.

use serde::{Deserialize, Serialize};

/// Machine-readable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// No signer configured on the client context.
    MissingSigner,
    /// Mint addresses missing, unparsable, or not distinct.
    InvalidMintAddresses,
    /// Neither a pool id nor a complete mint pair was supplied.
    MissingPoolIdentifier,
    /// Pool lookup returned nothing for the given id.
    PoolNotFound,
    /// Resolved account is not owned by the expected AMM program.
    InvalidPoolType,
    /// Mint-pair search returned no pools.
    NoPoolsFound,
    /// Slippage outside the accepted basis-point window.
    InvalidSlippageRange,
    /// Non-positive or unrepresentable amount.
    InvalidAmount,
    /// Zero or negative reserve in curve math.
    InvalidReserve,
    /// Requested output meets or exceeds pool reserves.
    InsufficientLiquidity,
    /// Swap input mint does not belong to the pool.
    InvalidInputMint,
    /// Swap output mint does not belong to the pool.
    InvalidOutputMint,
    /// Fee config index outside the fetched config list.
    InvalidFeeConfigIndex,
    /// Caller holds no LP tokens for the pool.
    NoLpBalance,
    /// Requested LP amount exceeds holdings.
    InsufficientLpBalance,
    /// Curve math overflowed.
    MathOverflow,
    /// Client context could not be constructed.
    SdkInitFailed,
    /// Fee config fetch or decode failed.
    ConfigFetchFailed,
    /// Transaction signing, simulation or submission failed.
    TransactionExecutionFailed,
}

impl ErrorCode {
    /// SCREAMING_SNAKE_CASE code for UI consumption.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingSigner => "MISSING_SIGNER",
            ErrorCode::InvalidMintAddresses => "INVALID_MINT_ADDRESSES",
            ErrorCode::MissingPoolIdentifier => "MISSING_POOL_IDENTIFIER",
            ErrorCode::PoolNotFound => "POOL_NOT_FOUND",
            ErrorCode::InvalidPoolType => "INVALID_POOL_TYPE",
            ErrorCode::NoPoolsFound => "NO_POOLS_FOUND",
            ErrorCode::InvalidSlippageRange => "INVALID_SLIPPAGE_RANGE",
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
            ErrorCode::InvalidReserve => "INVALID_RESERVE",
            ErrorCode::InsufficientLiquidity => "INSUFFICIENT_LIQUIDITY",
            ErrorCode::InvalidInputMint => "INVALID_INPUT_MINT",
            ErrorCode::InvalidOutputMint => "INVALID_OUTPUT_MINT",
            ErrorCode::InvalidFeeConfigIndex => "INVALID_FEE_CONFIG_INDEX",
            ErrorCode::NoLpBalance => "NO_LP_BALANCE",
            ErrorCode::InsufficientLpBalance => "INSUFFICIENT_LP_BALANCE",
            ErrorCode::MathOverflow => "MATH_OVERFLOW",
            ErrorCode::SdkInitFailed => "SDK_INIT_FAILED",
            ErrorCode::ConfigFetchFailed => "CONFIG_FETCH_FAILED",
            ErrorCode::TransactionExecutionFailed => "TRANSACTION_EXECUTION_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every operation in this workspace.
///
/// Carries a human-readable message, a machine code, the originating
/// operation name, and an optional nested cause. Nothing here is fatal to
/// the process; each error is scoped to one operation invocation.
#[derive(Debug, thiserror::Error)]
#[error("{operation}: {message} [{code}]")]
pub struct OperationError {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Name of the operation that raised the error.
    pub operation: &'static str,
    /// Underlying cause, when wrapping a lower-level failure.
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl OperationError {
    /// Creates a new operation error.
    pub fn new(operation: &'static str, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            operation,
            cause: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_cause(
        mut self,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Re-tags an error with the operation that ultimately surfaced it.
    #[must_use]
    pub fn in_operation(mut self, operation: &'static str) -> Self {
        self.operation = operation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_render_screaming_snake_case() {
        assert_eq!(ErrorCode::MissingSigner.as_str(), "MISSING_SIGNER");
        assert_eq!(ErrorCode::NoLpBalance.as_str(), "NO_LP_BALANCE");
        assert_eq!(
            ErrorCode::TransactionExecutionFailed.as_str(),
            "TRANSACTION_EXECUTION_FAILED"
        );
    }

    #[test]
    fn display_includes_operation_and_code() {
        let err = OperationError::new("swap_exact_in", ErrorCode::InvalidInputMint, "bad mint");
        let rendered = err.to_string();
        assert!(rendered.contains("swap_exact_in"));
        assert!(rendered.contains("INVALID_INPUT_MINT"));
    }

    #[test]
    fn cause_is_preserved_as_source() {
        let io = std::io::Error::other("boom");
        let err = OperationError::new("create_pool", ErrorCode::TransactionExecutionFailed, "send")
            .with_cause(io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
