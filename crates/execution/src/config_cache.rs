//! Fee config cache with a time-to-live.

use async_trait::async_trait;
use cpmm_domain::enums::Cluster;
use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_protocols::raydium::api::IndexClient;
use cpmm_protocols::raydium::{pda, state::FeeConfig};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

/// Default entry lifetime.
pub const DEFAULT_CONFIG_TTL: Duration = Duration::from_secs(300);

/// Source of fee config tiers; the index-backed fetcher is the production
/// implementation.
#[async_trait]
pub trait FeeConfigSource: Send + Sync {
    async fn fetch_fee_configs(&self, cluster: Cluster) -> Result<Vec<FeeConfig>, OperationError>;
}

/// Fetches config tiers from the primary index. For clusters without
/// their own index deployment, each tier's address is re-derived as the
/// cluster program's PDA before use.
pub struct IndexFeeConfigSource {
    index: IndexClient,
}

impl IndexFeeConfigSource {
    pub fn new() -> Self {
        Self {
            // Config tiers are published on the primary cluster's index.
            index: IndexClient::new(Cluster::Mainnet),
        }
    }
}

impl Default for IndexFeeConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeeConfigSource for IndexFeeConfigSource {
    async fn fetch_fee_configs(&self, cluster: Cluster) -> Result<Vec<FeeConfig>, OperationError> {
        let mut configs = self.index.cpmm_configs().await.map_err(|e| {
            OperationError::new(
                "fee_configs",
                ErrorCode::ConfigFetchFailed,
                "fee config fetch failed",
            )
            .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
        })?;

        if !cluster.has_index() {
            let program = Pubkey::from_str(cluster.amm_program_id()).map_err(|e| {
                OperationError::new(
                    "fee_configs",
                    ErrorCode::SdkInitFailed,
                    "invalid AMM program id",
                )
                .with_cause(e)
            })?;
            for config in &mut configs {
                config.id = pda::amm_config_address(&program, config.index);
            }
        }

        info!(cluster = cluster.name(), count = configs.len(), "Fetched fee configs");
        Ok(configs)
    }
}

struct CacheEntry {
    configs: Arc<Vec<FeeConfig>>,
    fetched_at: Instant,
}

/// TTL cache of fee config tiers, keyed by cluster.
///
/// Entries are only ever replaced by overwrite, atomically behind the
/// lock, so a reader never observes a half-updated list. Concurrent
/// misses may each trigger a fetch; the fetch is idempotent and the last
/// writer wins.
pub struct ConfigCache {
    source: Arc<dyn FeeConfigSource>,
    ttl: Duration,
    entries: RwLock<HashMap<Cluster, CacheEntry>>,
}

impl ConfigCache {
    pub fn new(source: Arc<dyn FeeConfigSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cluster's config tiers, refreshing on miss or expiry.
    pub async fn get(&self, cluster: Cluster) -> Result<Arc<Vec<FeeConfig>>, OperationError> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&cluster)
                && entry.fetched_at.elapsed() < self.ttl
            {
                return Ok(entry.configs.clone());
            }
        }

        debug!(cluster = cluster.name(), "Fee config cache miss");
        let configs = Arc::new(self.source.fetch_fee_configs(cluster).await?);

        let mut entries = self.entries.write().await;
        entries.insert(
            cluster,
            CacheEntry {
                configs: configs.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(configs)
    }

    /// Drops a cluster's entry, forcing the next read to refetch.
    pub async fn invalidate(&self, cluster: Cluster) {
        self.entries.write().await.remove(&cluster);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fetches: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeeConfigSource for CountingSource {
        async fn fetch_fee_configs(
            &self,
            _cluster: Cluster,
        ) -> Result<Vec<FeeConfig>, OperationError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![FeeConfig {
                id: Pubkey::new_unique(),
                index: 0,
                trade_fee_rate: 2_500,
                protocol_fee_rate: 120_000,
                fund_fee_rate: 40_000,
                create_pool_fee: 150_000_000,
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reads_within_ttl_share_one_fetch() {
        let source = CountingSource::new();
        let cache = ConfigCache::new(source.clone(), DEFAULT_CONFIG_TTL);

        let first = cache.get(Cluster::Mainnet).await.unwrap();
        let second = cache.get(Cluster::Mainnet).await.unwrap();

        assert_eq!(source.fetch_count(), 1);
        // Identical configs by value, same shared list.
        assert_eq!(*first, *second);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_triggers_exactly_one_refetch() {
        let source = CountingSource::new();
        let cache = ConfigCache::new(source.clone(), DEFAULT_CONFIG_TTL);

        cache.get(Cluster::Mainnet).await.unwrap();
        tokio::time::advance(DEFAULT_CONFIG_TTL + Duration::from_secs(1)).await;
        cache.get(Cluster::Mainnet).await.unwrap();
        cache.get(Cluster::Mainnet).await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clusters_are_cached_independently() {
        let source = CountingSource::new();
        let cache = ConfigCache::new(source.clone(), DEFAULT_CONFIG_TTL);

        cache.get(Cluster::Mainnet).await.unwrap();
        cache.get(Cluster::Devnet).await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_a_refetch() {
        let source = CountingSource::new();
        let cache = ConfigCache::new(source.clone(), DEFAULT_CONFIG_TTL);

        cache.get(Cluster::Mainnet).await.unwrap();
        cache.invalidate(Cluster::Mainnet).await;
        cache.get(Cluster::Mainnet).await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }
}
