//! On-chain account layouts for the CP-Swap program.
//!
//! Anchor accounts: an 8-byte discriminator followed by the borsh-encoded
//! body. The structs below stop before the reserved padding words, so
//! decoding reads a prefix of the account data and stays robust against
//! padding-only layout growth.

use anyhow::{Result, bail};
use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;

/// `sha256("account:PoolState")[..8]`.
pub const POOL_STATE_DISCRIMINATOR: [u8; 8] = [247, 237, 227, 245, 215, 195, 222, 70];

/// `sha256("account:AmmConfig")[..8]`.
pub const AMM_CONFIG_DISCRIMINATOR: [u8; 8] = [218, 244, 33, 104, 203, 203, 43, 111];

/// Body of the pool state account.
#[derive(BorshDeserialize, Debug, Clone)]
pub struct PoolStateAccount {
    pub amm_config: Pubkey,
    pub pool_creator: Pubkey,
    pub token_0_vault: Pubkey,
    pub token_1_vault: Pubkey,
    pub lp_mint: Pubkey,
    pub token_0_mint: Pubkey,
    pub token_1_mint: Pubkey,
    pub token_0_program: Pubkey,
    pub token_1_program: Pubkey,
    pub observation_key: Pubkey,
    pub auth_bump: u8,
    /// Bit flags gating deposit/withdraw/swap.
    pub status: u8,
    pub lp_mint_decimals: u8,
    pub mint_0_decimals: u8,
    pub mint_1_decimals: u8,
    pub lp_supply: u64,
    /// Trade fees owed to the protocol, held inside the vaults.
    pub protocol_fees_token_0: u64,
    pub protocol_fees_token_1: u64,
    pub fund_fees_token_0: u64,
    pub fund_fees_token_1: u64,
    pub open_time: u64,
}

impl PoolStateAccount {
    /// Vault balance minus the fees accrued inside it; the amount that
    /// actually backs the constant-product invariant.
    pub fn net_reserve_0(&self, vault_balance: u64) -> u64 {
        vault_balance
            .saturating_sub(self.protocol_fees_token_0)
            .saturating_sub(self.fund_fees_token_0)
    }

    pub fn net_reserve_1(&self, vault_balance: u64) -> u64 {
        vault_balance
            .saturating_sub(self.protocol_fees_token_1)
            .saturating_sub(self.fund_fees_token_1)
    }
}

/// Body of a fee/curve config account.
#[derive(BorshDeserialize, Debug, Clone)]
pub struct AmmConfigAccount {
    pub bump: u8,
    pub disable_create_pool: bool,
    pub index: u16,
    /// Over a 1_000_000 denominator.
    pub trade_fee_rate: u64,
    pub protocol_fee_rate: u64,
    pub fund_fee_rate: u64,
    pub create_pool_fee: u64,
    pub protocol_owner: Pubkey,
    pub fund_owner: Pubkey,
}

fn strip_discriminator<'a>(data: &'a [u8], expected: &[u8; 8], name: &str) -> Result<&'a [u8]> {
    if data.len() < 8 {
        bail!("{name} account data too short: {} bytes", data.len());
    }
    if data[..8] != expected[..] {
        bail!("{name} discriminator mismatch");
    }
    Ok(&data[8..])
}

/// Decodes a pool state account, verifying the discriminator.
pub fn decode_pool_state(data: &[u8]) -> Result<PoolStateAccount> {
    let mut body = strip_discriminator(data, &POOL_STATE_DISCRIMINATOR, "PoolState")?;
    PoolStateAccount::deserialize(&mut body).map_err(|e| anyhow::anyhow!("PoolState decode: {e}"))
}

/// Decodes a fee config account, verifying the discriminator.
pub fn decode_amm_config(data: &[u8]) -> Result<AmmConfigAccount> {
    let mut body = strip_discriminator(data, &AMM_CONFIG_DISCRIMINATOR, "AmmConfig")?;
    AmmConfigAccount::deserialize(&mut body).map_err(|e| anyhow::anyhow!("AmmConfig decode: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use borsh::BorshSerialize;

    #[derive(BorshSerialize)]
    struct ConfigFixture {
        bump: u8,
        disable_create_pool: bool,
        index: u16,
        trade_fee_rate: u64,
        protocol_fee_rate: u64,
        fund_fee_rate: u64,
        create_pool_fee: u64,
        protocol_owner: Pubkey,
        fund_owner: Pubkey,
        padding: [u64; 16],
    }

    #[test]
    fn decodes_config_with_trailing_padding() {
        let fixture = ConfigFixture {
            bump: 254,
            disable_create_pool: false,
            index: 2,
            trade_fee_rate: 2_500,
            protocol_fee_rate: 120_000,
            fund_fee_rate: 40_000,
            create_pool_fee: 150_000_000,
            protocol_owner: Pubkey::new_unique(),
            fund_owner: Pubkey::new_unique(),
            padding: [0; 16],
        };
        let mut data = AMM_CONFIG_DISCRIMINATOR.to_vec();
        fixture.serialize(&mut data).unwrap();

        let decoded = decode_amm_config(&data).unwrap();
        assert_eq!(decoded.index, 2);
        assert_eq!(decoded.trade_fee_rate, 2_500);
        assert_eq!(decoded.create_pool_fee, 150_000_000);
    }

    #[test]
    fn rejects_wrong_discriminator() {
        let data = [0u8; 64];
        assert!(decode_amm_config(&data).is_err());
        assert!(decode_pool_state(&data).is_err());
    }

    #[test]
    fn net_reserves_subtract_accrued_fees() {
        let mut body = Vec::new();
        let fixture_pool = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        for key in [
            fixture_pool.0,
            fixture_pool.1,
            fixture_pool.2,
            fixture_pool.3,
            fixture_pool.4,
            fixture_pool.5,
            fixture_pool.6,
            fixture_pool.7,
            fixture_pool.8,
            fixture_pool.9,
        ] {
            body.extend_from_slice(key.as_ref());
        }
        body.extend_from_slice(&[255, 0, 9, 9, 6]); // bump, status, decimals
        for v in [1_000u64, 30, 20, 5, 5, 0] {
            body.extend_from_slice(&v.to_le_bytes());
        }

        let mut data = POOL_STATE_DISCRIMINATOR.to_vec();
        data.extend_from_slice(&body);

        let decoded = decode_pool_state(&data).unwrap();
        assert_eq!(decoded.lp_supply, 1_000);
        assert_eq!(decoded.net_reserve_0(500_000), 500_000 - 30 - 5);
        assert_eq!(decoded.net_reserve_1(400_000), 400_000 - 20 - 5);
    }
}
