//! Resolved pool and fee-config snapshots.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// One side of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSide {
    /// Token 0.
    A,
    /// Token 1.
    B,
}

/// Mint descriptor for one pool side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    /// Mint address.
    pub mint: Pubkey,
    /// Decimal precision.
    pub decimals: u8,
    /// Owning token program (legacy or token-2022).
    pub program: Pubkey,
}

/// Read-only pool snapshot with a lifetime of one operation.
///
/// Reserves and the trade fee rate are always captured together from the
/// same fetch; curve math must never mix values from different snapshots.
#[derive(Debug, Clone)]
pub struct PoolState {
    /// Pool state account.
    pub id: Pubkey,
    /// AMM program that owns the pool.
    pub program: Pubkey,
    /// Fee/curve config account the pool was created under.
    pub amm_config: Pubkey,
    /// Token 0 descriptor.
    pub token_a: TokenInfo,
    /// Token 1 descriptor.
    pub token_b: TokenInfo,
    /// Token 0 vault.
    pub vault_a: Pubkey,
    /// Token 1 vault.
    pub vault_b: Pubkey,
    /// LP mint.
    pub lp_mint: Pubkey,
    /// LP mint decimals.
    pub lp_decimals: u8,
    /// Price observation account.
    pub observation: Pubkey,
    /// Outstanding LP supply.
    pub lp_supply: u64,
    /// Token 0 reserve, net of accrued protocol and fund fees.
    pub reserve_a: u64,
    /// Token 1 reserve, net of accrued protocol and fund fees.
    pub reserve_b: u64,
    /// Trade fee rate in basis points.
    pub trade_fee_bps: u32,
    /// Unix timestamp the pool opens for trading.
    pub open_time: u64,
}

impl PoolState {
    /// Which side a mint occupies, if it belongs to this pool.
    pub fn side_of(&self, mint: &Pubkey) -> Option<PoolSide> {
        if *mint == self.token_a.mint {
            Some(PoolSide::A)
        } else if *mint == self.token_b.mint {
            Some(PoolSide::B)
        } else {
            None
        }
    }

    pub fn contains(&self, mint: &Pubkey) -> bool {
        self.side_of(mint).is_some()
    }

    /// Token descriptor for a side.
    pub fn token(&self, side: PoolSide) -> &TokenInfo {
        match side {
            PoolSide::A => &self.token_a,
            PoolSide::B => &self.token_b,
        }
    }

    /// Reserve for a side.
    pub fn reserve(&self, side: PoolSide) -> u64 {
        match side {
            PoolSide::A => self.reserve_a,
            PoolSide::B => self.reserve_b,
        }
    }

    /// Vault for a side.
    pub fn vault(&self, side: PoolSide) -> Pubkey {
        match side {
            PoolSide::A => self.vault_a,
            PoolSide::B => self.vault_b,
        }
    }
}

impl PoolSide {
    /// The opposite side.
    pub fn other(&self) -> PoolSide {
        match self {
            PoolSide::A => PoolSide::B,
            PoolSide::B => PoolSide::A,
        }
    }
}

/// A fee/curve configuration tier. The on-chain fee rates use a 1_000_000
/// denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Config account address (cluster-specific).
    pub id: Pubkey,
    /// Tier index, also the PDA seed.
    pub index: u16,
    /// Trade fee rate over 1e6.
    pub trade_fee_rate: u64,
    /// Protocol fee rate over 1e6.
    pub protocol_fee_rate: u64,
    /// Fund fee rate over 1e6.
    pub fund_fee_rate: u64,
    /// Flat pool-creation fee in lamports.
    pub create_pool_fee: u64,
}

impl FeeConfig {
    /// Trade fee rate converted to basis points.
    pub fn trade_fee_bps(&self) -> u32 {
        (self.trade_fee_rate / 100) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PoolState {
        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();
        PoolState {
            id: Pubkey::new_unique(),
            program: Pubkey::new_unique(),
            amm_config: Pubkey::new_unique(),
            token_a: TokenInfo {
                mint: mint_a,
                decimals: 9,
                program: spl_token::id(),
            },
            token_b: TokenInfo {
                mint: mint_b,
                decimals: 6,
                program: spl_token::id(),
            },
            vault_a: Pubkey::new_unique(),
            vault_b: Pubkey::new_unique(),
            lp_mint: Pubkey::new_unique(),
            lp_decimals: 9,
            observation: Pubkey::new_unique(),
            lp_supply: 1_000_000,
            reserve_a: 500_000,
            reserve_b: 750_000,
            trade_fee_bps: 25,
            open_time: 0,
        }
    }

    #[test]
    fn side_lookup() {
        let pool = pool();
        assert_eq!(pool.side_of(&pool.token_a.mint), Some(PoolSide::A));
        assert_eq!(pool.side_of(&pool.token_b.mint), Some(PoolSide::B));
        assert_eq!(pool.side_of(&Pubkey::new_unique()), None);
        assert_eq!(PoolSide::A.other(), PoolSide::B);
    }

    #[test]
    fn fee_rate_converts_to_bps() {
        let config = FeeConfig {
            id: Pubkey::new_unique(),
            index: 0,
            trade_fee_rate: 2_500,
            protocol_fee_rate: 120_000,
            fund_fee_rate: 40_000,
            create_pool_fee: 150_000_000,
        };
        assert_eq!(config.trade_fee_bps(), 25);
    }
}
