use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// A token amount in the mint's smallest unit, tagged with its decimals.
///
/// All curve math and instruction data run on `raw`; conversion to and from
/// human-readable decimals happens only at the orchestration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount {
    pub raw: u64,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: u64, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Converts a human-readable amount into raw units, rounding down.
    ///
    /// Returns `None` for negative values or values that do not fit in a
    /// `u64` after scaling.
    pub fn from_decimal(value: Decimal, decimals: u8) -> Option<Self> {
        if value.is_sign_negative() {
            return None;
        }
        let multiplier = Decimal::from(10u64.checked_pow(u32::from(decimals))?);
        let raw = value.checked_mul(multiplier)?.trunc().to_u64()?;
        Some(Self { raw, decimals })
    }

    /// Converts a float from an external boundary (index API, CLI) into raw
    /// units via `Decimal`, rounding down.
    pub fn from_f64(value: f64, decimals: u8) -> Option<Self> {
        Self::from_decimal(Decimal::from_f64(value)?, decimals)
    }

    /// Human-readable representation.
    pub fn to_decimal(&self) -> Decimal {
        let divisor = Decimal::from(10u64.pow(u32::from(self.decimals)));
        Decimal::from(self.raw) / divisor
    }

    pub fn is_zero(&self) -> bool {
        self.raw == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decimal_round_trip() {
        let amount = Amount::from_decimal(dec!(1.5), 9).unwrap();
        assert_eq!(amount.raw, 1_500_000_000);
        assert_eq!(amount.to_decimal(), dec!(1.5));
    }

    #[test]
    fn conversion_truncates_sub_unit_precision() {
        let amount = Amount::from_decimal(dec!(0.1234567899), 6).unwrap();
        assert_eq!(amount.raw, 123_456);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(Amount::from_decimal(dec!(-1), 6).is_none());
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        assert!(Amount::from_decimal(Decimal::MAX, 9).is_none());
    }
}
