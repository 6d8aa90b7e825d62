//! Pool resolution: by explicit id, by mint-pair search, or fallback.

use async_trait::async_trait;
use cpmm_domain::enums::{Cluster, PoolSortBy};
use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_domain::value_objects::Amount;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use super::api::{ApiPoolInfo, IndexClient};
use super::state::{PoolState, TokenInfo};
use super::{layout, pda};
use crate::PoolSource;
use crate::rpc::RpcProvider;

const OP: &str = "pool_locator";
const SEARCH_PAGE_SIZE: u16 = 100;

/// Resolves pool ids and fetches pool snapshots.
///
/// On clusters with an off-chain index, discovery and metadata come from
/// the index and the pool's program id is validated against the expected
/// AMM program. On clusters without one, state is read directly from the
/// on-chain account layout.
pub struct PoolLocator {
    provider: Arc<RpcProvider>,
    index: IndexClient,
    cluster: Cluster,
    amm_program: Pubkey,
}

impl PoolLocator {
    pub fn new(provider: Arc<RpcProvider>, cluster: Cluster) -> Result<Self, OperationError> {
        let amm_program = Pubkey::from_str(cluster.amm_program_id()).map_err(|e| {
            OperationError::new(OP, ErrorCode::SdkInitFailed, "invalid AMM program id")
                .with_cause(e)
        })?;
        Ok(Self {
            provider,
            index: IndexClient::new(cluster),
            cluster,
            amm_program,
        })
    }

    /// The AMM program expected to own every resolved pool.
    pub fn amm_program(&self) -> &Pubkey {
        &self.amm_program
    }

    /// Resolves a pool id. Precedence: an explicit id wins; a complete
    /// mint pair triggers a search (first match, or best by criterion);
    /// with no inputs at all the cluster's default pool is used. A lone
    /// mint is an error, reported before any network call.
    pub async fn resolve_pool_id(
        &self,
        explicit: Option<Pubkey>,
        mint_a: Option<Pubkey>,
        mint_b: Option<Pubkey>,
        auto_select_best: bool,
        sort_by: PoolSortBy,
    ) -> Result<Pubkey, OperationError> {
        if let Some(id) = explicit {
            return Ok(id);
        }
        match (mint_a, mint_b) {
            (Some(a), Some(b)) => {
                if a == b {
                    return Err(OperationError::new(
                        OP,
                        ErrorCode::InvalidMintAddresses,
                        "mint addresses must be distinct",
                    ));
                }
                if auto_select_best {
                    let best = self.find_best_pool(&a, &b, sort_by).await?;
                    info!(pool = %best.id, "Auto-selected best pool");
                    Ok(best.id)
                } else {
                    self.first_pool_id(&a, &b, sort_by).await
                }
            }
            (None, None) => Pubkey::from_str(self.cluster.default_pool_id()).map_err(|e| {
                OperationError::new(OP, ErrorCode::SdkInitFailed, "invalid default pool id")
                    .with_cause(e)
            }),
            _ => Err(OperationError::new(
                OP,
                ErrorCode::MissingPoolIdentifier,
                "supply a pool id or both mint addresses",
            )),
        }
    }

    /// Fetches all candidate pools for the pair and returns the best one
    /// by the sort criterion, descending.
    pub async fn find_best_pool(
        &self,
        mint_a: &Pubkey,
        mint_b: &Pubkey,
        sort_by: PoolSortBy,
    ) -> Result<PoolState, OperationError> {
        if self.cluster.has_index() {
            let candidates = self.search_index(mint_a, mint_b, sort_by).await?;
            let best = candidates
                .into_iter()
                .max_by(|x, y| {
                    x.sort_metric(sort_by)
                        .total_cmp(&y.sort_metric(sort_by))
                })
                .ok_or_else(|| {
                    OperationError::new(
                        OP,
                        ErrorCode::NoPoolsFound,
                        format!("no pools found for {mint_a}/{mint_b}"),
                    )
                })?;
            self.state_from_api(&best)
        } else {
            // No index: the canonical pool under config tier 0 is the only
            // discoverable candidate.
            self.derived_pool(mint_a, mint_b).await.map_err(|mut e| {
                if e.code == ErrorCode::PoolNotFound {
                    e.code = ErrorCode::NoPoolsFound;
                }
                e
            })
        }
    }

    /// Fetches a pool snapshot.
    ///
    /// `live_reserves` additionally pulls the instantaneous reserve and
    /// fee-rate data required by swap math; both always come from the same
    /// on-chain read so the snapshot is internally consistent.
    pub async fn fetch_pool_state(
        &self,
        pool_id: &Pubkey,
        live_reserves: bool,
    ) -> Result<PoolState, OperationError> {
        if !self.cluster.has_index() {
            // Without an index every field already comes from the chain.
            return self.fetch_onchain(pool_id).await;
        }

        let entries = self
            .index
            .pools_by_ids(&[*pool_id])
            .await
            .map_err(|e| {
                OperationError::new(OP, ErrorCode::PoolNotFound, "index lookup failed")
                    .with_cause(anyhow_to_cause(e))
            })?;
        let info = entries.into_iter().flatten().next().ok_or_else(|| {
            OperationError::new(
                OP,
                ErrorCode::PoolNotFound,
                format!("pool {pool_id} not known to the index"),
            )
        })?;
        self.validate_program(&info)?;

        if live_reserves {
            // Swap math needs reserves and fee rate as of now, not as of
            // the last index crawl.
            self.fetch_onchain(pool_id).await
        } else {
            self.state_from_api(&info)
        }
    }

    async fn first_pool_id(
        &self,
        mint_a: &Pubkey,
        mint_b: &Pubkey,
        sort_by: PoolSortBy,
    ) -> Result<Pubkey, OperationError> {
        if self.cluster.has_index() {
            let candidates = self.search_index(mint_a, mint_b, sort_by).await?;
            let first = candidates.first().ok_or_else(|| {
                OperationError::new(
                    OP,
                    ErrorCode::NoPoolsFound,
                    format!("no pools found for {mint_a}/{mint_b}"),
                )
            })?;
            Pubkey::from_str(&first.id).map_err(|e| {
                OperationError::new(OP, ErrorCode::PoolNotFound, "malformed index entry")
                    .with_cause(e)
            })
        } else {
            Ok(self.derived_pool(mint_a, mint_b).await?.id)
        }
    }

    /// Index search filtered to pools owned by the expected AMM program.
    async fn search_index(
        &self,
        mint_a: &Pubkey,
        mint_b: &Pubkey,
        sort_by: PoolSortBy,
    ) -> Result<Vec<ApiPoolInfo>, OperationError> {
        let pools = self
            .index
            .pools_by_mint_pair(mint_a, mint_b, sort_by, SEARCH_PAGE_SIZE)
            .await
            .map_err(|e| {
                OperationError::new(OP, ErrorCode::NoPoolsFound, "pool search failed")
                    .with_cause(anyhow_to_cause(e))
            })?;
        let expected = self.amm_program.to_string();
        let matching: Vec<ApiPoolInfo> = pools
            .into_iter()
            .filter(|p| p.program_id == expected)
            .collect();
        debug!(count = matching.len(), "Pool search candidates");
        Ok(matching)
    }

    /// The canonical pool PDA for the pair under config tier 0, fetched
    /// on-chain. Used on clusters without an index.
    async fn derived_pool(
        &self,
        mint_a: &Pubkey,
        mint_b: &Pubkey,
    ) -> Result<PoolState, OperationError> {
        let (mint_0, mint_1) = pda::order_mints(*mint_a, *mint_b);
        let amm_config = pda::amm_config_address(&self.amm_program, 0);
        let pool_id = pda::pool_address(&self.amm_program, &amm_config, &mint_0, &mint_1);
        self.fetch_onchain(&pool_id).await
    }

    /// Reads the pool, its fee config and both vault balances from the
    /// chain. Reserves are net of accrued protocol and fund fees.
    async fn fetch_onchain(&self, pool_id: &Pubkey) -> Result<PoolState, OperationError> {
        let account = self
            .provider
            .get_account(pool_id)
            .await
            .map_err(|e| {
                OperationError::new(OP, ErrorCode::PoolNotFound, "pool account fetch failed")
                    .with_cause(anyhow_to_cause(e))
            })?
            .ok_or_else(|| {
                OperationError::new(
                    OP,
                    ErrorCode::PoolNotFound,
                    format!("pool {pool_id} does not exist"),
                )
            })?;

        if account.owner != self.amm_program {
            return Err(OperationError::new(
                OP,
                ErrorCode::InvalidPoolType,
                format!("account {pool_id} is owned by {}", account.owner),
            ));
        }

        let decoded = layout::decode_pool_state(&account.data).map_err(|e| {
            OperationError::new(OP, ErrorCode::InvalidPoolType, "pool layout decode failed")
                .with_cause(anyhow_to_cause(e))
        })?;

        let config_account = self
            .provider
            .get_account(&decoded.amm_config)
            .await
            .map_err(|e| {
                OperationError::new(OP, ErrorCode::ConfigFetchFailed, "config fetch failed")
                    .with_cause(anyhow_to_cause(e))
            })?
            .ok_or_else(|| {
                OperationError::new(
                    OP,
                    ErrorCode::ConfigFetchFailed,
                    format!("fee config {} does not exist", decoded.amm_config),
                )
            })?;
        let config = layout::decode_amm_config(&config_account.data).map_err(|e| {
            OperationError::new(OP, ErrorCode::ConfigFetchFailed, "config decode failed")
                .with_cause(anyhow_to_cause(e))
        })?;

        // Independent reads issued together; either failure aborts.
        let (vault_0, vault_1) = tokio::try_join!(
            self.provider.token_balance(&decoded.token_0_vault),
            self.provider.token_balance(&decoded.token_1_vault),
        )
        .map_err(|e| {
            OperationError::new(OP, ErrorCode::PoolNotFound, "vault balance fetch failed")
                .with_cause(anyhow_to_cause(e))
        })?;
        let (vault_0, vault_1) = match (vault_0, vault_1) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(OperationError::new(
                    OP,
                    ErrorCode::InvalidPoolType,
                    "pool vault account missing",
                ));
            }
        };

        Ok(PoolState {
            id: *pool_id,
            program: self.amm_program,
            amm_config: decoded.amm_config,
            token_a: TokenInfo {
                mint: decoded.token_0_mint,
                decimals: decoded.mint_0_decimals,
                program: decoded.token_0_program,
            },
            token_b: TokenInfo {
                mint: decoded.token_1_mint,
                decimals: decoded.mint_1_decimals,
                program: decoded.token_1_program,
            },
            vault_a: decoded.token_0_vault,
            vault_b: decoded.token_1_vault,
            lp_mint: decoded.lp_mint,
            lp_decimals: decoded.lp_mint_decimals,
            observation: decoded.observation_key,
            lp_supply: decoded.lp_supply,
            reserve_a: decoded.net_reserve_0(vault_0.amount),
            reserve_b: decoded.net_reserve_1(vault_1.amount),
            trade_fee_bps: (config.trade_fee_rate / 100) as u32,
            open_time: decoded.open_time,
        })
    }

    fn validate_program(&self, info: &ApiPoolInfo) -> Result<(), OperationError> {
        if info.program_id != self.amm_program.to_string() {
            return Err(OperationError::new(
                OP,
                ErrorCode::InvalidPoolType,
                format!("pool {} belongs to program {}", info.id, info.program_id),
            ));
        }
        Ok(())
    }

    /// Builds a snapshot from an index entry. Vault and observation
    /// addresses are PDA-derived; reserves convert from the index's
    /// decimal amounts exactly once, here.
    fn state_from_api(&self, info: &ApiPoolInfo) -> Result<PoolState, OperationError> {
        let malformed = |field: &str| {
            OperationError::new(
                OP,
                ErrorCode::PoolNotFound,
                format!("malformed index entry: {field}"),
            )
        };

        let id = Pubkey::from_str(&info.id).map_err(|_| malformed("id"))?;
        let mint_a = Pubkey::from_str(&info.mint_a.address).map_err(|_| malformed("mintA"))?;
        let mint_b = Pubkey::from_str(&info.mint_b.address).map_err(|_| malformed("mintB"))?;
        let program_a =
            Pubkey::from_str(&info.mint_a.program_id).map_err(|_| malformed("mintA program"))?;
        let program_b =
            Pubkey::from_str(&info.mint_b.program_id).map_err(|_| malformed("mintB program"))?;
        let lp_mint = Pubkey::from_str(&info.lp_mint.address).map_err(|_| malformed("lpMint"))?;

        let amm_config = match &info.config {
            Some(config) => Pubkey::from_str(&config.id).map_err(|_| malformed("config id"))?,
            None => pda::amm_config_address(&self.amm_program, 0),
        };

        let reserve_a = Amount::from_f64(info.mint_amount_a, info.mint_a.decimals)
            .ok_or_else(|| malformed("mintAmountA"))?
            .raw;
        let reserve_b = Amount::from_f64(info.mint_amount_b, info.mint_b.decimals)
            .ok_or_else(|| malformed("mintAmountB"))?
            .raw;
        let lp_supply = info
            .lp_amount
            .and_then(|v| Amount::from_f64(v, info.lp_mint.decimals))
            .map(|a| a.raw)
            .unwrap_or(0);

        Ok(PoolState {
            id,
            program: self.amm_program,
            amm_config,
            token_a: TokenInfo {
                mint: mint_a,
                decimals: info.mint_a.decimals,
                program: program_a,
            },
            token_b: TokenInfo {
                mint: mint_b,
                decimals: info.mint_b.decimals,
                program: program_b,
            },
            vault_a: pda::vault_address(&self.amm_program, &id, &mint_a),
            vault_b: pda::vault_address(&self.amm_program, &id, &mint_b),
            lp_mint,
            lp_decimals: info.lp_mint.decimals,
            observation: pda::observation_address(&self.amm_program, &id),
            lp_supply,
            reserve_a,
            reserve_b,
            trade_fee_bps: (info.fee_rate * 10_000.0).round() as u32,
            open_time: 0,
        })
    }
}

#[async_trait]
impl PoolSource for PoolLocator {
    async fn pool_state(
        &self,
        pool_id: &Pubkey,
        live_reserves: bool,
    ) -> Result<PoolState, OperationError> {
        self.fetch_pool_state(pool_id, live_reserves).await
    }
}

fn anyhow_to_cause(e: anyhow::Error) -> Box<dyn std::error::Error + Send + Sync> {
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::commitment_config::CommitmentConfig;

    fn locator(cluster: Cluster) -> PoolLocator {
        let provider = Arc::new(RpcProvider::new(
            cluster.default_rpc_url(),
            CommitmentConfig::confirmed(),
        ));
        PoolLocator::new(provider, cluster).unwrap()
    }

    #[tokio::test]
    async fn explicit_id_wins_without_network() {
        let locator = locator(Cluster::Devnet);
        let id = Pubkey::new_unique();
        let resolved = locator
            .resolve_pool_id(
                Some(id),
                Some(Pubkey::new_unique()),
                None,
                false,
                PoolSortBy::Liquidity,
            )
            .await
            .unwrap();
        assert_eq!(resolved, id);
    }

    #[tokio::test]
    async fn lone_mint_is_rejected_before_any_network_call() {
        let locator = locator(Cluster::Devnet);
        let err = locator
            .resolve_pool_id(
                None,
                Some(Pubkey::new_unique()),
                None,
                false,
                PoolSortBy::Liquidity,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingPoolIdentifier);
    }

    #[tokio::test]
    async fn equal_mints_are_rejected() {
        let locator = locator(Cluster::Devnet);
        let mint = Pubkey::new_unique();
        let err = locator
            .resolve_pool_id(None, Some(mint), Some(mint), true, PoolSortBy::Liquidity)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidMintAddresses);
    }

    #[tokio::test]
    async fn no_inputs_fall_back_to_the_cluster_default() {
        for cluster in [Cluster::Mainnet, Cluster::Devnet] {
            let locator = locator(cluster);
            let resolved = locator
                .resolve_pool_id(None, None, None, false, PoolSortBy::Liquidity)
                .await
                .unwrap();
            assert_eq!(resolved.to_string(), cluster.default_pool_id());
        }
    }
}
