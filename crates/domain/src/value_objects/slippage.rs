use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, OperationError};

/// Slippage tolerance in basis points, validated to the accepted window
/// `[1, 10000]` (0.01% to 100%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slippage(u32);

impl Slippage {
    pub const MIN_BPS: u32 = 1;
    pub const MAX_BPS: u32 = 10_000;

    /// Validates a basis-point tolerance supplied by a caller.
    pub fn from_bps(bps: u32) -> Result<Self, OperationError> {
        if !(Self::MIN_BPS..=Self::MAX_BPS).contains(&bps) {
            return Err(OperationError::new(
                "slippage",
                ErrorCode::InvalidSlippageRange,
                format!("slippage must be within [{}, {}] bps, got {bps}", Self::MIN_BPS, Self::MAX_BPS),
            ));
        }
        Ok(Self(bps))
    }

    /// Validates a percentage (e.g. `0.5` for 0.5%).
    pub fn from_percent(percent: Decimal) -> Result<Self, OperationError> {
        let bps = (percent * Decimal::from(100u32)).to_u32().ok_or_else(|| {
            OperationError::new(
                "slippage",
                ErrorCode::InvalidSlippageRange,
                format!("slippage percent not representable: {percent}"),
            )
        })?;
        Self::from_bps(bps)
    }

    pub fn bps(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use rust_decimal_macros::dec;

    #[test]
    fn accepts_the_full_window() {
        assert!(Slippage::from_bps(1).is_ok());
        assert!(Slippage::from_bps(10_000).is_ok());
    }

    #[test]
    fn rejects_out_of_window_values() {
        assert_eq!(
            Slippage::from_bps(0).unwrap_err().code,
            ErrorCode::InvalidSlippageRange
        );
        assert_eq!(
            Slippage::from_bps(10_001).unwrap_err().code,
            ErrorCode::InvalidSlippageRange
        );
    }

    #[test]
    fn percent_converts_to_bps() {
        assert_eq!(Slippage::from_percent(dec!(0.5)).unwrap().bps(), 50);
        assert_eq!(Slippage::from_percent(dec!(1)).unwrap().bps(), 100);
    }
}
