//! Constant-product curve math (`reserve_in * reserve_out = k`).
//!
//! All functions are pure and side-effect free, operate on raw integer
//! amounts, and widen to `U256` internally so intermediate products cannot
//! overflow. Fee rates are in basis points over [`FEE_DENOMINATOR`].

use primitive_types::U256;

use crate::enums::SlippageDirection;

/// Basis-point denominator (10_000 bps = 100%).
pub const FEE_DENOMINATOR: u64 = 10_000;

/// Failure modes of the pure curve functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    /// A reserve was zero; the pool has no liquidity on that side.
    #[error("reserves must be non-zero")]
    InvalidReserve,
    /// Requested output meets or exceeds the destination reserve.
    #[error("requested output exceeds available liquidity")]
    InsufficientLiquidity,
    /// Slippage outside `[0, 10000]` basis points.
    #[error("slippage out of range")]
    InvalidSlippage,
    /// Fee rate at or above 100%.
    #[error("fee rate out of range")]
    InvalidFeeRate,
    /// Intermediate value exceeded the representable range.
    #[error("math overflow")]
    Overflow,
}

/// Result of a swap quote: amounts and the reserve snapshot they were
/// computed from. Discard after use; never persist across pool refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapComputation {
    /// Gross input amount, fee included.
    pub amount_in: u64,
    /// Output amount credited to the trader.
    pub amount_out: u64,
    /// Trade fee charged on the input side.
    pub trade_fee: u64,
    /// Source reserve used for the quote.
    pub reserve_in: u64,
    /// Destination reserve used for the quote.
    pub reserve_out: u64,
}

/// Pair amount for a two-sided deposit together with its slippage bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityAmounts {
    /// Amount of the non-authoritative side, proportional to reserves.
    pub pair_amount: u64,
    /// Slippage-adjusted bound on the pair amount.
    pub pair_amount_limit: u64,
}

/// Quotes an exact-input swap.
///
/// The fee is deducted from the input before the invariant is applied, so
/// the output always satisfies `amount_out < reserve_out`: the pool cannot
/// be drained by a swap.
pub fn swap_exact_in(
    amount_in: u64,
    reserve_in: u64,
    reserve_out: u64,
    fee_rate_bps: u32,
) -> Result<SwapComputation, CurveError> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(CurveError::InvalidReserve);
    }
    if u64::from(fee_rate_bps) >= FEE_DENOMINATOR {
        return Err(CurveError::InvalidFeeRate);
    }

    // amount_in_net = floor(amount_in * (10000 - fee) / 10000); the fee is
    // whatever the floor leaves behind, i.e. rounded up in the pool's favor.
    let amount_in_net = mul_div_floor(
        U256::from(amount_in),
        U256::from(FEE_DENOMINATOR - u64::from(fee_rate_bps)),
        U256::from(FEE_DENOMINATOR),
    )?;
    let trade_fee = amount_in - as_u64(amount_in_net)?;

    // out = reserve_out * in_net / (reserve_in + in_net)
    let numerator = amount_in_net
        .checked_mul(U256::from(reserve_out))
        .ok_or(CurveError::Overflow)?;
    let denominator = U256::from(reserve_in)
        .checked_add(amount_in_net)
        .ok_or(CurveError::Overflow)?;
    let amount_out = as_u64(numerator / denominator)?;

    Ok(SwapComputation {
        amount_in,
        amount_out,
        trade_fee,
        reserve_in,
        reserve_out,
    })
}

/// Quotes an exact-output swap: the input required to receive
/// `amount_out` from the pool, fee included.
pub fn swap_exact_out(
    amount_out: u64,
    reserve_in: u64,
    reserve_out: u64,
    fee_rate_bps: u32,
) -> Result<SwapComputation, CurveError> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(CurveError::InvalidReserve);
    }
    if u64::from(fee_rate_bps) >= FEE_DENOMINATOR {
        return Err(CurveError::InvalidFeeRate);
    }
    if amount_out >= reserve_out {
        return Err(CurveError::InsufficientLiquidity);
    }

    // in_net = ceil(reserve_in * out / (reserve_out - out))
    let amount_in_net = mul_div_ceil(
        U256::from(reserve_in),
        U256::from(amount_out),
        U256::from(reserve_out - amount_out),
    )?;

    // Gross the fee back up: in = ceil(in_net * 10000 / (10000 - fee)).
    let amount_in = as_u64(mul_div_ceil(
        amount_in_net,
        U256::from(FEE_DENOMINATOR),
        U256::from(FEE_DENOMINATOR - u64::from(fee_rate_bps)),
    )?)?;
    let trade_fee = amount_in - as_u64(amount_in_net)?;

    Ok(SwapComputation {
        amount_in,
        amount_out,
        trade_fee,
        reserve_in,
        reserve_out,
    })
}

/// Proportional pair amount for a two-sided deposit:
/// `quote = base * quote_reserve / base_reserve`, rounded down so the
/// computation never asks for more of the scarce side than the caller
/// supplied.
pub fn compute_pair_amount(
    base_amount: u64,
    base_reserve: u64,
    quote_reserve: u64,
) -> Result<u64, CurveError> {
    if base_reserve == 0 || quote_reserve == 0 {
        return Err(CurveError::InvalidReserve);
    }
    as_u64(mul_div_floor(
        U256::from(base_amount),
        U256::from(quote_reserve),
        U256::from(base_reserve),
    )?)
}

/// Applies a slippage bound to an expected amount.
///
/// `Floor` yields the minimum acceptable amount (outputs, withdrawals);
/// `Ceiling` yields the maximum the caller is willing to supply (deposit
/// pair amounts). Zero slippage is the identity.
pub fn apply_slippage(
    amount: u64,
    slippage_bps: u32,
    direction: SlippageDirection,
) -> Result<u64, CurveError> {
    if u64::from(slippage_bps) > FEE_DENOMINATOR {
        return Err(CurveError::InvalidSlippage);
    }
    let bps = u64::from(slippage_bps);
    match direction {
        SlippageDirection::Floor => as_u64(mul_div_floor(
            U256::from(amount),
            U256::from(FEE_DENOMINATOR - bps),
            U256::from(FEE_DENOMINATOR),
        )?),
        SlippageDirection::Ceiling => as_u64(mul_div_ceil(
            U256::from(amount),
            U256::from(FEE_DENOMINATOR + bps),
            U256::from(FEE_DENOMINATOR),
        )?),
    }
}

/// Pair amount plus its slippage bound in one step.
pub fn compute_liquidity_amounts(
    base_amount: u64,
    base_reserve: u64,
    quote_reserve: u64,
    slippage_bps: u32,
    direction: SlippageDirection,
) -> Result<LiquidityAmounts, CurveError> {
    let pair_amount = compute_pair_amount(base_amount, base_reserve, quote_reserve)?;
    let pair_amount_limit = apply_slippage(pair_amount, slippage_bps, direction)?;
    Ok(LiquidityAmounts {
        pair_amount,
        pair_amount_limit,
    })
}

/// Pro-rata share: `amount * numerator / denominator`, rounded down.
/// Used for LP supply math (tokens per LP burned, LP per deposit).
pub fn pro_rata_floor(amount: u64, numerator: u64, denominator: u64) -> Result<u64, CurveError> {
    if denominator == 0 {
        return Err(CurveError::InvalidReserve);
    }
    as_u64(mul_div_floor(
        U256::from(amount),
        U256::from(numerator),
        U256::from(denominator),
    )?)
}

fn mul_div_floor(a: U256, b: U256, den: U256) -> Result<U256, CurveError> {
    if den.is_zero() {
        return Err(CurveError::InvalidReserve);
    }
    Ok(a.checked_mul(b).ok_or(CurveError::Overflow)? / den)
}

fn mul_div_ceil(a: U256, b: U256, den: U256) -> Result<U256, CurveError> {
    if den.is_zero() {
        return Err(CurveError::InvalidReserve);
    }
    let product = a.checked_mul(b).ok_or(CurveError::Overflow)?;
    Ok((product + den - U256::one()) / den)
}

fn as_u64(v: U256) -> Result<u64, CurveError> {
    if v > U256::from(u64::MAX) {
        return Err(CurveError::Overflow);
    }
    Ok(v.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_in_matches_reference_scenario() {
        // reserves (1_000_000, 2_000_000), fee 25 bps, input 10_000
        let quote = swap_exact_in(10_000, 1_000_000, 2_000_000, 25).unwrap();
        let net = 10_000u128 * (10_000 - 25) / 10_000;
        let expected = net * 2_000_000 / (1_000_000 + net);
        assert_eq!(u128::from(quote.amount_out), expected);
        assert_eq!(quote.trade_fee, 25);
    }

    #[test]
    fn exact_in_never_drains_the_pool() {
        for amount_in in [1u64, 1_000, 1_000_000, u32::MAX as u64] {
            let quote = swap_exact_in(amount_in, 5_000, 9_999, 30).unwrap();
            assert!(quote.amount_out < 9_999);
        }
    }

    #[test]
    fn exact_in_is_strictly_increasing_in_input() {
        let mut last = 0;
        for amount_in in [10_000u64, 50_000, 250_000, 1_250_000] {
            let quote = swap_exact_in(amount_in, 1_000_000, 2_000_000, 25).unwrap();
            assert!(quote.amount_out > last);
            last = quote.amount_out;
        }
    }

    #[test]
    fn exact_in_rejects_empty_reserves() {
        assert_eq!(
            swap_exact_in(100, 0, 1_000, 25),
            Err(CurveError::InvalidReserve)
        );
        assert_eq!(
            swap_exact_in(100, 1_000, 0, 25),
            Err(CurveError::InvalidReserve)
        );
    }

    #[test]
    fn exact_out_rejects_requests_at_or_above_reserve() {
        assert_eq!(
            swap_exact_out(1_000, 1_000_000, 1_000, 25),
            Err(CurveError::InsufficientLiquidity)
        );
        assert_eq!(
            swap_exact_out(2_000, 1_000_000, 1_000, 25),
            Err(CurveError::InsufficientLiquidity)
        );
    }

    #[test]
    fn round_trip_within_one_unit() {
        for amount_in in [10_000u64, 77_777, 500_000] {
            let forward = swap_exact_in(amount_in, 1_000_000, 2_000_000, 25).unwrap();
            let back =
                swap_exact_out(forward.amount_out, 1_000_000, 2_000_000, 25).unwrap();
            assert!(back.amount_in.abs_diff(amount_in) <= 1);
        }
    }

    #[test]
    fn exact_out_input_covers_the_quoted_output() {
        // Paying the quoted input must buy at least the requested output.
        let quote = swap_exact_out(31_337, 1_000_000, 2_000_000, 30).unwrap();
        let check = swap_exact_in(quote.amount_in, 1_000_000, 2_000_000, 30).unwrap();
        assert!(check.amount_out >= 31_337);
    }

    #[test]
    fn pair_amount_is_proportional_and_floored() {
        assert_eq!(compute_pair_amount(100, 1_000, 3_000).unwrap(), 300);
        // 7 * 100 / 3 = 233.33 -> 233
        assert_eq!(compute_pair_amount(7, 3, 100).unwrap(), 233);
    }

    #[test]
    fn liquidity_amounts_reference_scenario() {
        // base 100, reserves (1000, 3000), 1% slippage floor -> (300, 297)
        let amounts =
            compute_liquidity_amounts(100, 1_000, 3_000, 100, SlippageDirection::Floor).unwrap();
        assert_eq!(amounts.pair_amount, 300);
        assert_eq!(amounts.pair_amount_limit, 297);
    }

    #[test]
    fn slippage_zero_is_identity() {
        assert_eq!(
            apply_slippage(123_456, 0, SlippageDirection::Floor).unwrap(),
            123_456
        );
        assert_eq!(
            apply_slippage(123_456, 0, SlippageDirection::Ceiling).unwrap(),
            123_456
        );
    }

    #[test]
    fn slippage_floor_is_monotonically_non_increasing() {
        let mut last = u64::MAX;
        for bps in [0u32, 1, 50, 100, 500, 10_000] {
            let bounded = apply_slippage(1_000_000, bps, SlippageDirection::Floor).unwrap();
            assert!(bounded <= last);
            last = bounded;
        }
        assert_eq!(last, 0); // 100% slippage floors to zero
    }

    #[test]
    fn slippage_out_of_range_is_rejected() {
        assert_eq!(
            apply_slippage(1_000, 10_001, SlippageDirection::Floor),
            Err(CurveError::InvalidSlippage)
        );
    }

    #[test]
    fn pro_rata_floors() {
        // 50 LP of a 1000 supply over 333 reserve -> 16.65 -> 16
        assert_eq!(pro_rata_floor(50, 333, 1_000).unwrap(), 16);
        assert_eq!(pro_rata_floor(50, 333, 0), Err(CurveError::InvalidReserve));
    }
}
