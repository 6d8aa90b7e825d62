//! Instruction builders for the CP-Swap and lock programs.
//!
//! Anchor instructions: an 8-byte method discriminator followed by the
//! borsh-encoded arguments. Account orders follow the program IDLs.

use anyhow::{Context, Result};
use cpmm_domain::enums::Cluster;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::sysvar;
use solana_system_interface::{instruction as system_instruction, program as system_program};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use std::str::FromStr;

use super::pda;
use super::state::{PoolSide, PoolState};

pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";
pub const METADATA_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";

/// `sha256("global:initialize")[..8]`.
const INITIALIZE_DISCRIMINATOR: [u8; 8] = [175, 175, 109, 31, 13, 152, 155, 237];
/// `sha256("global:deposit")[..8]`.
const DEPOSIT_DISCRIMINATOR: [u8; 8] = [242, 35, 198, 137, 82, 225, 242, 182];
/// `sha256("global:withdraw")[..8]`.
const WITHDRAW_DISCRIMINATOR: [u8; 8] = [183, 18, 70, 156, 148, 109, 161, 34];
/// `sha256("global:swap_base_input")[..8]`.
const SWAP_BASE_INPUT_DISCRIMINATOR: [u8; 8] = [143, 190, 90, 218, 196, 30, 51, 222];
/// `sha256("global:swap_base_output")[..8]`.
const SWAP_BASE_OUTPUT_DISCRIMINATOR: [u8; 8] = [55, 217, 98, 86, 163, 74, 180, 173];
/// `sha256("global:lock_cp_liquidity")[..8]`.
const LOCK_CP_LIQUIDITY_DISCRIMINATOR: [u8; 8] = [216, 157, 29, 78, 38, 51, 31, 26];
/// `sha256("global:collect_cp_fees")[..8]`.
const COLLECT_CP_FEES_DISCRIMINATOR: [u8; 8] = [8, 30, 51, 199, 209, 184, 247, 133];

/// Parameters for creating a new pool.
#[derive(Debug, Clone)]
pub struct InitializePoolParams {
    /// Fee config the pool is created under.
    pub amm_config: Pubkey,
    /// Token 0 mint (byte-wise smaller).
    pub mint_0: Pubkey,
    /// Token 1 mint.
    pub mint_1: Pubkey,
    /// Token program owning mint 0.
    pub mint_0_program: Pubkey,
    /// Token program owning mint 1.
    pub mint_1_program: Pubkey,
    /// Initial token 0 deposit, raw units.
    pub init_amount_0: u64,
    /// Initial token 1 deposit, raw units.
    pub init_amount_1: u64,
    /// Unix timestamp trading opens; 0 for immediately.
    pub open_time: u64,
}

/// Builds CP-Swap and lock-program instructions for one cluster.
pub struct CpmmInstructionBuilder {
    amm_program: Pubkey,
    lock_program: Pubkey,
    create_pool_fee_receiver: Pubkey,
    token_2022_program: Pubkey,
    memo_program: Pubkey,
    metadata_program: Pubkey,
}

impl CpmmInstructionBuilder {
    /// Creates a builder with the cluster's program deployments.
    pub fn for_cluster(cluster: Cluster) -> Result<Self> {
        Ok(Self {
            amm_program: Pubkey::from_str(cluster.amm_program_id())
                .context("Invalid AMM program id")?,
            lock_program: Pubkey::from_str(cluster.lock_program_id())
                .context("Invalid lock program id")?,
            create_pool_fee_receiver: Pubkey::from_str(cluster.create_pool_fee_receiver())
                .context("Invalid create-pool fee receiver")?,
            token_2022_program: Pubkey::from_str(TOKEN_2022_PROGRAM_ID)
                .context("Invalid token-2022 program id")?,
            memo_program: Pubkey::from_str(MEMO_PROGRAM_ID).context("Invalid memo program id")?,
            metadata_program: Pubkey::from_str(METADATA_PROGRAM_ID)
                .context("Invalid metadata program id")?,
        })
    }

    pub fn amm_program(&self) -> &Pubkey {
        &self.amm_program
    }

    pub fn lock_program(&self) -> &Pubkey {
        &self.lock_program
    }

    /// `initialize`: creates the pool, vaults, LP mint and observation
    /// account, and deposits the initial reserves.
    pub fn initialize(&self, creator: &Pubkey, params: &InitializePoolParams) -> Instruction {
        let authority = pda::authority_address(&self.amm_program);
        let pool = pda::pool_address(
            &self.amm_program,
            &params.amm_config,
            &params.mint_0,
            &params.mint_1,
        );
        let vault_0 = pda::vault_address(&self.amm_program, &pool, &params.mint_0);
        let vault_1 = pda::vault_address(&self.amm_program, &pool, &params.mint_1);
        let lp_mint = pda::lp_mint_address(&self.amm_program, &pool);
        let observation = pda::observation_address(&self.amm_program, &pool);

        let creator_token_0 = get_associated_token_address_with_program_id(
            creator,
            &params.mint_0,
            &params.mint_0_program,
        );
        let creator_token_1 = get_associated_token_address_with_program_id(
            creator,
            &params.mint_1,
            &params.mint_1_program,
        );
        let creator_lp_token =
            get_associated_token_address_with_program_id(creator, &lp_mint, &spl_token::id());

        let accounts = vec![
            AccountMeta::new(*creator, true),                         // creator
            AccountMeta::new_readonly(params.amm_config, false),      // amm_config
            AccountMeta::new_readonly(authority, false),              // authority
            AccountMeta::new(pool, false),                            // pool_state
            AccountMeta::new_readonly(params.mint_0, false),          // token_0_mint
            AccountMeta::new_readonly(params.mint_1, false),          // token_1_mint
            AccountMeta::new(lp_mint, false),                         // lp_mint
            AccountMeta::new(creator_token_0, false),                 // creator_token_0
            AccountMeta::new(creator_token_1, false),                 // creator_token_1
            AccountMeta::new(creator_lp_token, false),                // creator_lp_token
            AccountMeta::new(vault_0, false),                         // token_0_vault
            AccountMeta::new(vault_1, false),                         // token_1_vault
            AccountMeta::new(self.create_pool_fee_receiver, false),   // create_pool_fee
            AccountMeta::new(observation, false),                     // observation_state
            AccountMeta::new_readonly(spl_token::id(), false),        // token_program
            AccountMeta::new_readonly(params.mint_0_program, false),  // token_0_program
            AccountMeta::new_readonly(params.mint_1_program, false),  // token_1_program
            AccountMeta::new_readonly(spl_associated_token_account::id(), false), // associated_token_program
            AccountMeta::new_readonly(system_program::id(), false),   // system_program
            AccountMeta::new_readonly(sysvar::rent::id(), false),     // rent
        ];

        let mut data = Vec::with_capacity(32);
        data.extend_from_slice(&INITIALIZE_DISCRIMINATOR);
        data.extend_from_slice(&params.init_amount_0.to_le_bytes());
        data.extend_from_slice(&params.init_amount_1.to_le_bytes());
        data.extend_from_slice(&params.open_time.to_le_bytes());

        Instruction {
            program_id: self.amm_program,
            accounts,
            data,
        }
    }

    /// `deposit`: mints `lp_token_amount` against at most
    /// `maximum_token_0_amount` / `maximum_token_1_amount`.
    pub fn deposit(
        &self,
        pool: &PoolState,
        owner: &Pubkey,
        lp_token_amount: u64,
        maximum_token_0_amount: u64,
        maximum_token_1_amount: u64,
    ) -> Instruction {
        let authority = pda::authority_address(&pool.program);
        let owner_lp = self.lp_token_account(pool, owner);
        let token_0_account = self.user_token_account(pool, owner, PoolSide::A);
        let token_1_account = self.user_token_account(pool, owner, PoolSide::B);

        let accounts = vec![
            AccountMeta::new_readonly(*owner, true),                   // owner
            AccountMeta::new_readonly(authority, false),               // authority
            AccountMeta::new(pool.id, false),                          // pool_state
            AccountMeta::new(owner_lp, false),                         // owner_lp_token
            AccountMeta::new(token_0_account, false),                  // token_0_account
            AccountMeta::new(token_1_account, false),                  // token_1_account
            AccountMeta::new(pool.vault_a, false),                     // token_0_vault
            AccountMeta::new(pool.vault_b, false),                     // token_1_vault
            AccountMeta::new_readonly(spl_token::id(), false),         // token_program
            AccountMeta::new_readonly(self.token_2022_program, false), // token_program_2022
            AccountMeta::new_readonly(pool.token_a.mint, false),       // vault_0_mint
            AccountMeta::new_readonly(pool.token_b.mint, false),       // vault_1_mint
            AccountMeta::new(pool.lp_mint, false),                     // lp_mint
        ];

        let mut data = Vec::with_capacity(32);
        data.extend_from_slice(&DEPOSIT_DISCRIMINATOR);
        data.extend_from_slice(&lp_token_amount.to_le_bytes());
        data.extend_from_slice(&maximum_token_0_amount.to_le_bytes());
        data.extend_from_slice(&maximum_token_1_amount.to_le_bytes());

        Instruction {
            program_id: pool.program,
            accounts,
            data,
        }
    }

    /// `withdraw`: burns `lp_token_amount` for at least
    /// `minimum_token_0_amount` / `minimum_token_1_amount`.
    pub fn withdraw(
        &self,
        pool: &PoolState,
        owner: &Pubkey,
        lp_token_amount: u64,
        minimum_token_0_amount: u64,
        minimum_token_1_amount: u64,
    ) -> Instruction {
        let authority = pda::authority_address(&pool.program);
        let owner_lp = self.lp_token_account(pool, owner);
        let token_0_account = self.user_token_account(pool, owner, PoolSide::A);
        let token_1_account = self.user_token_account(pool, owner, PoolSide::B);

        let accounts = vec![
            AccountMeta::new_readonly(*owner, true),                   // owner
            AccountMeta::new_readonly(authority, false),               // authority
            AccountMeta::new(pool.id, false),                          // pool_state
            AccountMeta::new(owner_lp, false),                         // owner_lp_token
            AccountMeta::new(token_0_account, false),                  // token_0_account
            AccountMeta::new(token_1_account, false),                  // token_1_account
            AccountMeta::new(pool.vault_a, false),                     // token_0_vault
            AccountMeta::new(pool.vault_b, false),                     // token_1_vault
            AccountMeta::new_readonly(spl_token::id(), false),         // token_program
            AccountMeta::new_readonly(self.token_2022_program, false), // token_program_2022
            AccountMeta::new_readonly(pool.token_a.mint, false),       // vault_0_mint
            AccountMeta::new_readonly(pool.token_b.mint, false),       // vault_1_mint
            AccountMeta::new(pool.lp_mint, false),                     // lp_mint
            AccountMeta::new_readonly(self.memo_program, false),       // memo_program
        ];

        let mut data = Vec::with_capacity(32);
        data.extend_from_slice(&WITHDRAW_DISCRIMINATOR);
        data.extend_from_slice(&lp_token_amount.to_le_bytes());
        data.extend_from_slice(&minimum_token_0_amount.to_le_bytes());
        data.extend_from_slice(&minimum_token_1_amount.to_le_bytes());

        Instruction {
            program_id: pool.program,
            accounts,
            data,
        }
    }

    /// `swap_base_input`: swaps an exact input for at least
    /// `minimum_amount_out`. `input_side` is the pool side the input mint
    /// occupies.
    pub fn swap_base_input(
        &self,
        pool: &PoolState,
        payer: &Pubkey,
        input_side: PoolSide,
        amount_in: u64,
        minimum_amount_out: u64,
    ) -> Instruction {
        let mut data = Vec::with_capacity(24);
        data.extend_from_slice(&SWAP_BASE_INPUT_DISCRIMINATOR);
        data.extend_from_slice(&amount_in.to_le_bytes());
        data.extend_from_slice(&minimum_amount_out.to_le_bytes());
        self.swap_instruction(pool, payer, input_side, data)
    }

    /// `swap_base_output`: swaps at most `maximum_amount_in` for an exact
    /// output.
    pub fn swap_base_output(
        &self,
        pool: &PoolState,
        payer: &Pubkey,
        input_side: PoolSide,
        maximum_amount_in: u64,
        amount_out: u64,
    ) -> Instruction {
        let mut data = Vec::with_capacity(24);
        data.extend_from_slice(&SWAP_BASE_OUTPUT_DISCRIMINATOR);
        data.extend_from_slice(&maximum_amount_in.to_le_bytes());
        data.extend_from_slice(&amount_out.to_le_bytes());
        self.swap_instruction(pool, payer, input_side, data)
    }

    fn swap_instruction(
        &self,
        pool: &PoolState,
        payer: &Pubkey,
        input_side: PoolSide,
        data: Vec<u8>,
    ) -> Instruction {
        let authority = pda::authority_address(&pool.program);
        let output_side = input_side.other();
        let input_token = pool.token(input_side);
        let output_token = pool.token(output_side);
        let input_account = self.user_token_account(pool, payer, input_side);
        let output_account = self.user_token_account(pool, payer, output_side);

        let accounts = vec![
            AccountMeta::new_readonly(*payer, true),                  // payer
            AccountMeta::new_readonly(authority, false),              // authority
            AccountMeta::new_readonly(pool.amm_config, false),        // amm_config
            AccountMeta::new(pool.id, false),                         // pool_state
            AccountMeta::new(input_account, false),                   // input_token_account
            AccountMeta::new(output_account, false),                  // output_token_account
            AccountMeta::new(pool.vault(input_side), false),          // input_vault
            AccountMeta::new(pool.vault(output_side), false),         // output_vault
            AccountMeta::new_readonly(input_token.program, false),    // input_token_program
            AccountMeta::new_readonly(output_token.program, false),   // output_token_program
            AccountMeta::new_readonly(input_token.mint, false),       // input_token_mint
            AccountMeta::new_readonly(output_token.mint, false),      // output_token_mint
            AccountMeta::new(pool.observation, false),                // observation_state
        ];

        Instruction {
            program_id: pool.program,
            accounts,
            data,
        }
    }

    /// `lock_cp_liquidity`: locks LP tokens and mints a fee NFT that
    /// entitles its holder to the locked share's trading fees.
    ///
    /// `fee_nft_mint` is a fresh keypair pubkey and must co-sign the
    /// transaction.
    pub fn lock_liquidity(
        &self,
        pool: &PoolState,
        owner: &Pubkey,
        fee_nft_mint: &Pubkey,
        lp_amount: u64,
    ) -> Instruction {
        let lock_authority = pda::lock_authority_address(&self.lock_program);
        let locked_liquidity = pda::locked_liquidity_address(&self.lock_program, fee_nft_mint);
        let fee_nft_account =
            get_associated_token_address_with_program_id(owner, fee_nft_mint, &spl_token::id());
        let owner_lp = self.lp_token_account(pool, owner);
        let locked_lp_vault = get_associated_token_address_with_program_id(
            &lock_authority,
            &pool.lp_mint,
            &spl_token::id(),
        );
        let metadata_account = self.metadata_address(fee_nft_mint);

        let accounts = vec![
            AccountMeta::new_readonly(lock_authority, false),         // authority
            AccountMeta::new(*owner, true),                           // payer
            AccountMeta::new_readonly(*owner, true),                  // liquidity_owner
            AccountMeta::new_readonly(*owner, false),                 // fee_nft_owner
            AccountMeta::new(*fee_nft_mint, true),                    // fee_nft_mint
            AccountMeta::new(fee_nft_account, false),                 // fee_nft_account
            AccountMeta::new_readonly(pool.id, false),                // pool_state
            AccountMeta::new(locked_liquidity, false),                // locked_liquidity
            AccountMeta::new(pool.lp_mint, false),                    // lp_mint
            AccountMeta::new(owner_lp, false),                        // liquidity_owner_lp
            AccountMeta::new(locked_lp_vault, false),                 // locked_lp_vault
            AccountMeta::new(metadata_account, false),                // metadata_account
            AccountMeta::new_readonly(sysvar::rent::id(), false),     // rent
            AccountMeta::new_readonly(system_program::id(), false),   // system_program
            AccountMeta::new_readonly(spl_token::id(), false),        // token_program
            AccountMeta::new_readonly(spl_associated_token_account::id(), false), // associated_token_program
            AccountMeta::new_readonly(self.metadata_program, false),  // metadata_program
        ];

        let mut data = Vec::with_capacity(17);
        data.extend_from_slice(&LOCK_CP_LIQUIDITY_DISCRIMINATOR);
        data.extend_from_slice(&lp_amount.to_le_bytes());
        data.push(1); // with_metadata

        Instruction {
            program_id: self.lock_program,
            accounts,
            data,
        }
    }

    /// `collect_cp_fees`: harvests the trading fees accrued to a locked
    /// position, identified by its fee NFT.
    pub fn collect_locked_fees(
        &self,
        pool: &PoolState,
        fee_nft_owner: &Pubkey,
        fee_nft_mint: &Pubkey,
        fee_lp_amount: u64,
    ) -> Instruction {
        let lock_authority = pda::lock_authority_address(&self.lock_program);
        let locked_liquidity = pda::locked_liquidity_address(&self.lock_program, fee_nft_mint);
        let fee_nft_account = get_associated_token_address_with_program_id(
            fee_nft_owner,
            fee_nft_mint,
            &spl_token::id(),
        );
        let cp_authority = pda::authority_address(&pool.program);
        let recipient_token_0 = self.user_token_account(pool, fee_nft_owner, PoolSide::A);
        let recipient_token_1 = self.user_token_account(pool, fee_nft_owner, PoolSide::B);
        let locked_lp_vault = get_associated_token_address_with_program_id(
            &lock_authority,
            &pool.lp_mint,
            &spl_token::id(),
        );

        let accounts = vec![
            AccountMeta::new_readonly(lock_authority, false),          // authority
            AccountMeta::new(*fee_nft_owner, true),                    // fee_nft_owner
            AccountMeta::new_readonly(fee_nft_account, false),         // fee_nft_account
            AccountMeta::new(locked_liquidity, false),                 // locked_liquidity
            AccountMeta::new_readonly(pool.program, false),            // cpmm_program
            AccountMeta::new_readonly(cp_authority, false),            // cp_authority
            AccountMeta::new(pool.id, false),                          // pool_state
            AccountMeta::new(pool.lp_mint, false),                     // lp_mint
            AccountMeta::new(recipient_token_0, false),                // recipient_token_0_account
            AccountMeta::new(recipient_token_1, false),                // recipient_token_1_account
            AccountMeta::new(pool.vault_a, false),                     // token_0_vault
            AccountMeta::new(pool.vault_b, false),                     // token_1_vault
            AccountMeta::new_readonly(pool.token_a.mint, false),       // vault_0_mint
            AccountMeta::new_readonly(pool.token_b.mint, false),       // vault_1_mint
            AccountMeta::new(locked_lp_vault, false),                  // locked_lp_vault
            AccountMeta::new_readonly(spl_token::id(), false),         // token_program
            AccountMeta::new_readonly(self.token_2022_program, false), // token_program_2022
            AccountMeta::new_readonly(self.memo_program, false),       // memo_program
        ];

        let mut data = Vec::with_capacity(16);
        data.extend_from_slice(&COLLECT_CP_FEES_DISCRIMINATOR);
        data.extend_from_slice(&fee_lp_amount.to_le_bytes());

        Instruction {
            program_id: self.lock_program,
            accounts,
            data,
        }
    }

    /// The owner's associated token account for one pool side.
    pub fn user_token_account(&self, pool: &PoolState, owner: &Pubkey, side: PoolSide) -> Pubkey {
        let token = pool.token(side);
        get_associated_token_address_with_program_id(owner, &token.mint, &token.program)
    }

    /// The owner's associated LP token account.
    pub fn lp_token_account(&self, pool: &PoolState, owner: &Pubkey) -> Pubkey {
        get_associated_token_address_with_program_id(owner, &pool.lp_mint, &spl_token::id())
    }

    fn metadata_address(&self, mint: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(
            &[
                b"metadata",
                self.metadata_program.as_ref(),
                mint.as_ref(),
            ],
            &self.metadata_program,
        )
        .0
    }
}

/// Idempotently creates the owner's associated token account.
pub fn create_ata_idempotent(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    create_associated_token_account_idempotent(payer, owner, mint, token_program)
}

/// Wraps native SOL: transfers lamports into the owner's wrapped-SOL
/// associated account and syncs its balance. The account is created
/// idempotently first.
pub fn wrap_native(owner: &Pubkey, lamports: u64) -> Result<(Pubkey, Vec<Instruction>)> {
    let wsol_account = get_associated_token_address_with_program_id(
        owner,
        &spl_token::native_mint::id(),
        &spl_token::id(),
    );
    let instructions = vec![
        create_ata_idempotent(owner, owner, &spl_token::native_mint::id(), &spl_token::id()),
        system_instruction::transfer(owner, &wsol_account, lamports),
        spl_token::instruction::sync_native(&spl_token::id(), &wsol_account)
            .context("Failed to build sync_native")?,
    ];
    Ok((wsol_account, instructions))
}

/// Closes a token account back to its owner; used to unwrap SOL after a
/// swap or withdrawal.
pub fn close_token_account(owner: &Pubkey, account: &Pubkey) -> Result<Instruction> {
    spl_token::instruction::close_account(&spl_token::id(), account, owner, owner, &[])
        .context("Failed to build close_account")
}

/// Whether a mint is the wrapped native mint.
pub fn is_native_mint(mint: &Pubkey) -> bool {
    *mint == spl_token::native_mint::id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raydium::state::TokenInfo;

    fn pool(builder: &CpmmInstructionBuilder) -> PoolState {
        let (mint_0, mint_1) = pda::order_mints(Pubkey::new_unique(), Pubkey::new_unique());
        let amm_config = pda::amm_config_address(builder.amm_program(), 0);
        let id = pda::pool_address(builder.amm_program(), &amm_config, &mint_0, &mint_1);
        PoolState {
            id,
            program: *builder.amm_program(),
            amm_config,
            token_a: TokenInfo {
                mint: mint_0,
                decimals: 9,
                program: spl_token::id(),
            },
            token_b: TokenInfo {
                mint: mint_1,
                decimals: 6,
                program: spl_token::id(),
            },
            vault_a: pda::vault_address(builder.amm_program(), &id, &mint_0),
            vault_b: pda::vault_address(builder.amm_program(), &id, &mint_1),
            lp_mint: pda::lp_mint_address(builder.amm_program(), &id),
            lp_decimals: 9,
            observation: pda::observation_address(builder.amm_program(), &id),
            lp_supply: 1_000_000,
            reserve_a: 500_000,
            reserve_b: 750_000,
            trade_fee_bps: 25,
            open_time: 0,
        }
    }

    #[test]
    fn cluster_program_ids_parse() {
        assert!(CpmmInstructionBuilder::for_cluster(Cluster::Mainnet).is_ok());
        assert!(CpmmInstructionBuilder::for_cluster(Cluster::Devnet).is_ok());
    }

    #[test]
    fn swap_base_input_data_layout() {
        let builder = CpmmInstructionBuilder::for_cluster(Cluster::Mainnet).unwrap();
        let pool = pool(&builder);
        let payer = Pubkey::new_unique();

        let ix = builder.swap_base_input(&pool, &payer, PoolSide::A, 10_000, 9_900);
        assert_eq!(ix.program_id, pool.program);
        assert_eq!(ix.accounts.len(), 13);
        assert_eq!(ix.data[..8], SWAP_BASE_INPUT_DISCRIMINATOR);
        assert_eq!(ix.data[8..16], 10_000u64.to_le_bytes());
        assert_eq!(ix.data[16..24], 9_900u64.to_le_bytes());
        // payer signs, vaults are writable
        assert!(ix.accounts[0].is_signer);
        assert!(ix.accounts[6].is_writable);
        assert!(ix.accounts[7].is_writable);
    }

    #[test]
    fn swap_sides_mirror_vaults() {
        let builder = CpmmInstructionBuilder::for_cluster(Cluster::Mainnet).unwrap();
        let pool = pool(&builder);
        let payer = Pubkey::new_unique();

        let a_in = builder.swap_base_input(&pool, &payer, PoolSide::A, 1, 0);
        let b_in = builder.swap_base_input(&pool, &payer, PoolSide::B, 1, 0);
        assert_eq!(a_in.accounts[6].pubkey, pool.vault_a);
        assert_eq!(a_in.accounts[7].pubkey, pool.vault_b);
        assert_eq!(b_in.accounts[6].pubkey, pool.vault_b);
        assert_eq!(b_in.accounts[7].pubkey, pool.vault_a);
    }

    #[test]
    fn deposit_and_withdraw_data_layouts() {
        let builder = CpmmInstructionBuilder::for_cluster(Cluster::Devnet).unwrap();
        let pool = pool(&builder);
        let owner = Pubkey::new_unique();

        let deposit = builder.deposit(&pool, &owner, 500, 1_000, 2_000);
        assert_eq!(deposit.data[..8], DEPOSIT_DISCRIMINATOR);
        assert_eq!(deposit.accounts.len(), 13);

        let withdraw = builder.withdraw(&pool, &owner, 500, 990, 1_980);
        assert_eq!(withdraw.data[..8], WITHDRAW_DISCRIMINATOR);
        assert_eq!(withdraw.data[8..16], 500u64.to_le_bytes());
        // withdraw carries the trailing memo program account
        assert_eq!(withdraw.accounts.len(), 14);
    }

    #[test]
    fn lock_requires_nft_mint_signature() {
        let builder = CpmmInstructionBuilder::for_cluster(Cluster::Mainnet).unwrap();
        let pool = pool(&builder);
        let owner = Pubkey::new_unique();
        let nft_mint = Pubkey::new_unique();

        let ix = builder.lock_liquidity(&pool, &owner, &nft_mint, 12_345);
        assert_eq!(ix.program_id, *builder.lock_program());
        let nft_meta = ix
            .accounts
            .iter()
            .find(|meta| meta.pubkey == nft_mint)
            .unwrap();
        assert!(nft_meta.is_signer);
        assert_eq!(ix.data[..8], LOCK_CP_LIQUIDITY_DISCRIMINATOR);
        assert_eq!(*ix.data.last().unwrap(), 1); // with_metadata
    }

    #[test]
    fn wrap_native_transfers_then_syncs() {
        let owner = Pubkey::new_unique();
        let (wsol, instructions) = wrap_native(&owner, 1_000_000).unwrap();
        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[1].program_id, system_program::id());
        assert_eq!(instructions[2].program_id, spl_token::id());
        assert!(is_native_mint(&spl_token::native_mint::id()));
        assert_eq!(
            wsol,
            get_associated_token_address_with_program_id(
                &owner,
                &spl_token::native_mint::id(),
                &spl_token::id()
            )
        );
    }
}
