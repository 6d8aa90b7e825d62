//! Priority fee estimation from recent network samples.

use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_protocols::rpc::RpcProvider;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

/// How many of the highest observed fees enter the average.
pub const MAX_FEE_SAMPLES: usize = 100;

/// Arithmetic mean of the top [`MAX_FEE_SAMPLES`] samples by value,
/// ceiling-rounded. Zero when no samples are available.
///
/// The mean of the top slice bids competitively without committing to the
/// single most aggressive fee on the network.
pub fn average_top_fees(samples: &[u64]) -> u64 {
    if samples.is_empty() {
        return 0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.truncate(MAX_FEE_SAMPLES);

    let sum: u128 = sorted.iter().map(|fee| u128::from(*fee)).sum();
    let len = sorted.len() as u128;
    (sum.div_ceil(len)).min(u128::from(u64::MAX)) as u64
}

/// Samples recent prioritization fees over the transaction's writable
/// accounts and recommends a bid in micro-lamports per compute unit.
pub async fn estimate_priority_fee(
    provider: &RpcProvider,
    writable_accounts: &[Pubkey],
) -> Result<u64, OperationError> {
    let samples = provider
        .recent_prioritization_fees(writable_accounts)
        .await
        .map_err(|e| {
            OperationError::new(
                "estimate_priority_fee",
                ErrorCode::TransactionExecutionFailed,
                "prioritization fee sampling failed",
            )
            .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
        })?;
    let fee = average_top_fees(&samples);
    debug!(samples = samples.len(), fee, "Estimated priority fee");
    Ok(fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_samples_recommend_zero() {
        assert_eq!(average_top_fees(&[]), 0);
    }

    #[test]
    fn mean_is_ceiling_rounded() {
        // (100 + 200 + 301) / 3 = 200.33 -> 201
        assert_eq!(average_top_fees(&[100, 200, 301]), 201);
        assert_eq!(average_top_fees(&[100, 200, 300]), 200);
    }

    #[test]
    fn only_the_top_hundred_enter_the_average() {
        // 200 low samples and 100 high ones: the low tail must not dilute.
        let mut samples = vec![1u64; 200];
        samples.extend(std::iter::repeat_n(1_000u64, 100));
        assert_eq!(average_top_fees(&samples), 1_000);
    }

    #[test]
    fn order_does_not_matter() {
        assert_eq!(
            average_top_fees(&[5, 1, 9, 3]),
            average_top_fees(&[9, 5, 3, 1])
        );
    }
}
