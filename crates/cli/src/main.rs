//! Command line interface for the CPMM client engine.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use cpmm_domain::enums::{Cluster, PoolSortBy};
use cpmm_execution::prelude::*;
use dotenv::dotenv;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::keypair::read_keypair_file;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ClusterArg {
    Mainnet,
    Devnet,
}

impl From<ClusterArg> for Cluster {
    fn from(value: ClusterArg) -> Self {
        match value {
            ClusterArg::Mainnet => Cluster::Mainnet,
            ClusterArg::Devnet => Cluster::Devnet,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Liquidity,
    Volume,
}

impl From<SortArg> for PoolSortBy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Liquidity => PoolSortBy::Liquidity,
            SortArg::Volume => PoolSortBy::Volume24h,
        }
    }
}

#[derive(Parser)]
#[command(name = "cpmm")]
#[command(about = "Client for constant-product AMM pools", long_about = None)]
struct Cli {
    /// Cluster to operate on
    #[arg(long, value_enum, default_value_t = ClusterArg::Mainnet)]
    cluster: ClusterArg,

    /// RPC endpoint override
    #[arg(long)]
    url: Option<String>,

    /// Path to the signer keypair file
    #[arg(short, long, env = "KEYPAIR_PATH")]
    keypair: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check RPC endpoint health
    Health,
    /// List fee config tiers
    FeeConfigs,
    /// Show a pool's state
    PoolInfo {
        /// Pool id
        pool: String,
        /// Fetch live reserves from the chain
        #[arg(long)]
        live: bool,
    },
    /// Swap an exact input amount
    SwapIn {
        #[arg(long)]
        pool: Option<String>,
        /// Mint being sold
        #[arg(long)]
        input_mint: String,
        /// Input amount, human readable
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value_t = 50)]
        slippage_bps: u32,
    },
    /// Swap for an exact output amount
    SwapOut {
        #[arg(long)]
        pool: Option<String>,
        /// Mint being bought
        #[arg(long)]
        output_mint: String,
        /// Output amount, human readable
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value_t = 50)]
        slippage_bps: u32,
    },
    /// Deposit liquidity into a pool
    AddLiquidity {
        #[arg(long)]
        pool: Option<String>,
        #[arg(long)]
        mint_a: Option<String>,
        #[arg(long)]
        mint_b: Option<String>,
        /// Amount of the authoritative side, human readable
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value_t = 100)]
        slippage_bps: u32,
        /// Make the quote (token 1) side authoritative
        #[arg(long)]
        quote_in: bool,
        /// Auto-select the best pool for the mint pair
        #[arg(long)]
        best_pool: bool,
        #[arg(long, value_enum, default_value_t = SortArg::Liquidity)]
        sort_by: SortArg,
    },
    /// Withdraw liquidity from a pool
    RemoveLiquidity {
        #[arg(long)]
        pool: Option<String>,
        /// LP amount to burn; full balance when omitted
        #[arg(long)]
        lp_amount: Option<Decimal>,
        #[arg(long, default_value_t = 100)]
        slippage_bps: u32,
    },
    /// Create a new pool
    CreatePool {
        #[arg(long)]
        mint_a: String,
        #[arg(long)]
        mint_b: String,
        #[arg(long)]
        amount_a: Decimal,
        #[arg(long)]
        amount_b: Decimal,
        /// Unix timestamp trading opens
        #[arg(long)]
        start_time: Option<u64>,
        #[arg(long)]
        fee_config_index: Option<usize>,
    },
    /// Lock LP tokens for a fee NFT
    Lock {
        #[arg(long)]
        pool: Option<String>,
        /// LP amount to lock; full balance when omitted
        #[arg(long)]
        lp_amount: Option<Decimal>,
    },
    /// Harvest fees accrued to a locked position
    Harvest {
        #[arg(long)]
        pool: Option<String>,
        /// Fee NFT mint identifying the locked position
        #[arg(long)]
        fee_nft_mint: String,
        /// LP-denominated amount to claim; everything when omitted
        #[arg(long)]
        fee_amount: Option<Decimal>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cluster: Cluster = cli.cluster.into();

    let mut config = ClientConfig::for_cluster(cluster);
    if let Some(url) = cli.url.clone() {
        config.rpc_url = url;
    }
    let mut ctx = ClientContext::new(config).context("client initialization failed")?;
    if let Some(path) = &cli.keypair {
        let keypair = read_keypair_file(path)
            .map_err(|e| anyhow!("failed to read keypair {path}: {e}"))?;
        ctx = ctx.with_signer(Arc::new(keypair));
    }

    match cli.command {
        Commands::Health => {
            let status = ctx.check_connection().await;
            let state = ctx.connection().state().await;
            println!("status:  {status:?}");
            println!("retries: {}/{}", state.retry_count, state.max_retries);
            if let Some(error) = state.last_error {
                println!("error:   {error}");
            }
        }
        Commands::FeeConfigs => {
            let configs = ctx.fee_configs().await?;
            for config in configs.iter() {
                println!(
                    "index {:>2}  trade fee {:>5} bps  create fee {} lamports  {}",
                    config.index,
                    config.trade_fee_bps(),
                    config.create_pool_fee,
                    config.id
                );
            }
        }
        Commands::PoolInfo { pool, live } => {
            let pool_id = parse_pubkey(&pool, "pool id")?;
            let state = ctx.locator().fetch_pool_state(&pool_id, live).await?;
            println!("pool:      {}", state.id);
            println!(
                "token a:   {} (decimals {})",
                state.token_a.mint, state.token_a.decimals
            );
            println!(
                "token b:   {} (decimals {})",
                state.token_b.mint, state.token_b.decimals
            );
            println!("reserves:  {} / {}", state.reserve_a, state.reserve_b);
            println!("lp supply: {}", state.lp_supply);
            println!("trade fee: {} bps", state.trade_fee_bps);
        }
        Commands::SwapIn {
            pool,
            input_mint,
            amount,
            slippage_bps,
        } => {
            let swap = ctx
                .swap_exact_in(SwapExactInParams {
                    pool_id: parse_opt_pubkey(pool.as_deref(), "pool id")?,
                    input_mint: parse_pubkey(&input_mint, "input mint")?,
                    amount_in: amount,
                    slippage_bps,
                    base_in: None,
                })
                .await?;
            println!(
                "swapped {} in for {} out (fee {}, min out {})",
                swap.amount_in, swap.amount_out, swap.trade_fee, swap.limit_amount
            );
            print_receipt(&swap.result);
        }
        Commands::SwapOut {
            pool,
            output_mint,
            amount,
            slippage_bps,
        } => {
            let swap = ctx
                .swap_exact_out(SwapExactOutParams {
                    pool_id: parse_opt_pubkey(pool.as_deref(), "pool id")?,
                    output_mint: parse_pubkey(&output_mint, "output mint")?,
                    amount_out: amount,
                    slippage_bps,
                    base_in: None,
                })
                .await?;
            println!(
                "swapped {} in for {} out (fee {}, max in {})",
                swap.amount_in, swap.amount_out, swap.trade_fee, swap.limit_amount
            );
            print_receipt(&swap.result);
        }
        Commands::AddLiquidity {
            pool,
            mint_a,
            mint_b,
            amount,
            slippage_bps,
            quote_in,
            best_pool,
            sort_by,
        } => {
            let added = ctx
                .add_liquidity(AddLiquidityParams {
                    pool_id: parse_opt_pubkey(pool.as_deref(), "pool id")?,
                    mint_a: parse_opt_pubkey(mint_a.as_deref(), "mint a")?,
                    mint_b: parse_opt_pubkey(mint_b.as_deref(), "mint b")?,
                    input_amount: amount,
                    slippage_bps,
                    base_in: !quote_in,
                    auto_select_best_pool: best_pool,
                    pool_sort_by: sort_by.into(),
                })
                .await?;
            println!(
                "deposited {} (pair {} max {}) for {} LP",
                added.input_amount, added.pair_amount, added.pair_amount_limit, added.lp_amount
            );
            print_receipt(&added.result);
        }
        Commands::RemoveLiquidity {
            pool,
            lp_amount,
            slippage_bps,
        } => {
            let removed = ctx
                .remove_liquidity(RemoveLiquidityParams {
                    pool_id: parse_opt_pubkey(pool.as_deref(), "pool id")?,
                    lp_amount,
                    slippage_bps,
                })
                .await?;
            println!(
                "burned {} LP for at least {} / {}",
                removed.lp_burned, removed.minimum_amount_a, removed.minimum_amount_b
            );
            print_receipt(&removed.result);
        }
        Commands::CreatePool {
            mint_a,
            mint_b,
            amount_a,
            amount_b,
            start_time,
            fee_config_index,
        } => {
            let created = ctx
                .create_pool(CreatePoolParams {
                    mint_a: parse_pubkey(&mint_a, "mint a")?,
                    mint_b: parse_pubkey(&mint_b, "mint b")?,
                    amount_a,
                    amount_b,
                    start_time,
                    fee_config_index,
                })
                .await?;
            println!("created pool {}", created.pool_id);
            println!("lp mint:  {}", created.lp_mint);
            print_receipt(&created.result);
        }
        Commands::Lock { pool, lp_amount } => {
            let locked = ctx
                .lock_liquidity(LockLiquidityParams {
                    pool_id: parse_opt_pubkey(pool.as_deref(), "pool id")?,
                    lp_amount,
                })
                .await?;
            println!(
                "locked {} LP, fee NFT mint {}",
                locked.lp_locked, locked.fee_nft_mint
            );
            print_receipt(&locked.result);
        }
        Commands::Harvest {
            pool,
            fee_nft_mint,
            fee_amount,
        } => {
            let harvested = ctx
                .harvest_lock(HarvestLockParams {
                    pool_id: parse_opt_pubkey(pool.as_deref(), "pool id")?,
                    fee_nft_mint: parse_pubkey(&fee_nft_mint, "fee NFT mint")?,
                    fee_amount,
                })
                .await?;
            println!("harvested lock {}", harvested.fee_nft_mint);
            print_receipt(&harvested.result);
        }
    }

    Ok(())
}

fn parse_pubkey(value: &str, what: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).map_err(|e| anyhow!("invalid {what} '{value}': {e}"))
}

fn parse_opt_pubkey(value: Option<&str>, what: &str) -> Result<Option<Pubkey>> {
    value.map(|v| parse_pubkey(v, what)).transpose()
}

fn print_receipt(result: &OperationResult) {
    println!("signature: {}", result.signature);
    println!("explorer:  {}", result.explorer_url);
    println!("confirmed: {}", result.timestamp.to_rfc3339());
}
