//! Program-derived addresses for the CP-Swap and lock programs.

use solana_sdk::pubkey::Pubkey;

pub const AMM_CONFIG_SEED: &[u8] = b"amm_config";
pub const POOL_SEED: &[u8] = b"pool";
pub const AUTH_SEED: &[u8] = b"vault_and_lp_mint_auth_seed";
pub const POOL_VAULT_SEED: &[u8] = b"pool_vault";
pub const POOL_LP_MINT_SEED: &[u8] = b"pool_lp_mint";
pub const OBSERVATION_SEED: &[u8] = b"observation";
pub const LOCK_AUTH_SEED: &[u8] = b"lock_cp_authority_seed";
pub const LOCKED_LIQUIDITY_SEED: &[u8] = b"locked_liquidity";

/// Fee config address for a tier index. The index is big-endian in the
/// seed.
pub fn amm_config_address(program: &Pubkey, index: u16) -> Pubkey {
    Pubkey::find_program_address(&[AMM_CONFIG_SEED, &index.to_be_bytes()], program).0
}

/// Pool state address for an ordered mint pair under a config.
pub fn pool_address(
    program: &Pubkey,
    amm_config: &Pubkey,
    mint_0: &Pubkey,
    mint_1: &Pubkey,
) -> Pubkey {
    Pubkey::find_program_address(
        &[
            POOL_SEED,
            amm_config.as_ref(),
            mint_0.as_ref(),
            mint_1.as_ref(),
        ],
        program,
    )
    .0
}

/// Vault and LP mint authority, one per program deployment.
pub fn authority_address(program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[AUTH_SEED], program).0
}

/// Token vault for one pool side.
pub fn vault_address(program: &Pubkey, pool: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[POOL_VAULT_SEED, pool.as_ref(), mint.as_ref()], program).0
}

/// LP mint of a pool.
pub fn lp_mint_address(program: &Pubkey, pool: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[POOL_LP_MINT_SEED, pool.as_ref()], program).0
}

/// Price observation account of a pool.
pub fn observation_address(program: &Pubkey, pool: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[OBSERVATION_SEED, pool.as_ref()], program).0
}

/// Authority holding locked LP vaults, one per lock program deployment.
pub fn lock_authority_address(lock_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[LOCK_AUTH_SEED], lock_program).0
}

/// Locked-liquidity record for a fee NFT mint.
pub fn locked_liquidity_address(lock_program: &Pubkey, fee_nft_mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[LOCKED_LIQUIDITY_SEED, fee_nft_mint.as_ref()], lock_program).0
}

/// Canonical mint ordering required by the pool PDA: the byte-wise smaller
/// mint is token 0.
pub fn order_mints(mint_x: Pubkey, mint_y: Pubkey) -> (Pubkey, Pubkey) {
    if mint_x.to_bytes() < mint_y.to_bytes() {
        (mint_x, mint_y)
    } else {
        (mint_y, mint_x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_addresses_differ_by_index() {
        let program = Pubkey::new_unique();
        assert_ne!(
            amm_config_address(&program, 0),
            amm_config_address(&program, 1)
        );
    }

    #[test]
    fn pool_address_is_deterministic() {
        let program = Pubkey::new_unique();
        let config = Pubkey::new_unique();
        let (m0, m1) = order_mints(Pubkey::new_unique(), Pubkey::new_unique());
        assert_eq!(
            pool_address(&program, &config, &m0, &m1),
            pool_address(&program, &config, &m0, &m1)
        );
    }

    #[test]
    fn mint_ordering_is_symmetric() {
        let x = Pubkey::new_unique();
        let y = Pubkey::new_unique();
        assert_eq!(order_mints(x, y), order_mints(y, x));
        let (m0, m1) = order_mints(x, y);
        assert!(m0.to_bytes() < m1.to_bytes());
    }
}
