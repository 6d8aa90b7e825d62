//! Client context: one explicit handle wiring every component together.

use cpmm_domain::enums::Cluster;
use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_protocols::raydium::instructions::CpmmInstructionBuilder;
use cpmm_protocols::raydium::locator::PoolLocator;
use cpmm_protocols::raydium::state::FeeConfig;
use cpmm_protocols::rpc::RpcProvider;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config_cache::{ConfigCache, DEFAULT_CONFIG_TTL, IndexFeeConfigSource};
use crate::connection::{ConnectionMonitor, ConnectionStatus, DEFAULT_MAX_RETRIES};
use crate::fees;
use crate::ops;
use crate::transaction::{DynSigner, TransactionExecutor};

/// Construction-time configuration for a [`ClientContext`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub cluster: Cluster,
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    /// Fee config cache entry lifetime.
    pub config_ttl: Duration,
    /// Compute unit cap set on every transaction.
    pub compute_unit_limit: Option<u32>,
    /// Bid a priority fee estimated from recent network samples.
    pub auto_priority_fee: bool,
    /// Simulate transactions before submitting them.
    pub simulate_before_send: bool,
    pub max_reconnect_retries: u32,
}

impl ClientConfig {
    /// Defaults for a cluster, using its public RPC endpoint.
    pub fn for_cluster(cluster: Cluster) -> Self {
        Self {
            cluster,
            rpc_url: cluster.default_rpc_url().to_string(),
            commitment: CommitmentConfig::confirmed(),
            config_ttl: DEFAULT_CONFIG_TTL,
            compute_unit_limit: Some(600_000),
            auto_priority_fee: true,
            simulate_before_send: false,
            max_reconnect_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_cluster(Cluster::Mainnet)
    }
}

/// The engine's single entry point.
///
/// Constructed once and passed by handle into every operation; the config
/// cache and connection state live here rather than in process globals.
pub struct ClientContext {
    cluster: Cluster,
    provider: Arc<RpcProvider>,
    locator: PoolLocator,
    instructions: CpmmInstructionBuilder,
    executor: TransactionExecutor,
    config_cache: ConfigCache,
    connection: ConnectionMonitor,
    signer: Option<DynSigner>,
    auto_priority_fee: bool,
}

impl ClientContext {
    /// Builds a context from configuration. Fails with `SDK_INIT_FAILED`
    /// when cluster constants do not parse; performs no network I/O.
    pub fn new(config: ClientConfig) -> Result<Self, OperationError> {
        let provider = Arc::new(RpcProvider::new(&config.rpc_url, config.commitment));
        let locator = PoolLocator::new(provider.clone(), config.cluster)?;
        let instructions = CpmmInstructionBuilder::for_cluster(config.cluster).map_err(|e| {
            OperationError::new(
                "client_context",
                ErrorCode::SdkInitFailed,
                "instruction builder construction failed",
            )
            .with_cause(Box::<dyn std::error::Error + Send + Sync>::from(e))
        })?;

        let mut executor = TransactionExecutor::new(provider.clone(), config.cluster);
        executor.set_simulate_first(config.simulate_before_send);
        executor.set_compute_unit_limit(config.compute_unit_limit);

        let config_cache = ConfigCache::new(
            Arc::new(IndexFeeConfigSource::new()),
            config.config_ttl,
        );
        let connection =
            ConnectionMonitor::new(provider.clone(), config.max_reconnect_retries);

        Ok(Self {
            cluster: config.cluster,
            provider,
            locator,
            instructions,
            executor,
            config_cache,
            connection,
            signer: None,
            auto_priority_fee: config.auto_priority_fee,
        })
    }

    /// Attaches the active signer supplied by the wallet layer.
    #[must_use]
    pub fn with_signer(mut self, signer: DynSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    pub fn provider(&self) -> &Arc<RpcProvider> {
        &self.provider
    }

    pub fn locator(&self) -> &PoolLocator {
        &self.locator
    }

    pub(crate) fn instructions(&self) -> &CpmmInstructionBuilder {
        &self.instructions
    }

    pub(crate) fn executor(&self) -> &TransactionExecutor {
        &self.executor
    }

    /// The active signer, or `MISSING_SIGNER` tagged with the operation.
    pub(crate) fn signer_or_err(
        &self,
        operation: &'static str,
    ) -> Result<&DynSigner, OperationError> {
        self.signer.as_ref().ok_or_else(|| {
            OperationError::new(operation, ErrorCode::MissingSigner, "no signer configured")
        })
    }

    /// Fee config tiers for this context's cluster, cached with a TTL.
    pub async fn fee_configs(&self) -> Result<Arc<Vec<FeeConfig>>, OperationError> {
        self.config_cache.get(self.cluster).await
    }

    pub fn config_cache(&self) -> &ConfigCache {
        &self.config_cache
    }

    pub fn connection(&self) -> &ConnectionMonitor {
        &self.connection
    }

    /// Probes endpoint health, reconnecting with backoff on failure.
    pub async fn check_connection(&self) -> ConnectionStatus {
        self.connection.check_connection().await
    }

    /// Recommends a priority fee over the instructions' writable accounts.
    /// Estimation failures degrade to no bid rather than failing the
    /// operation.
    pub(crate) async fn priority_fee(&self, instructions: &[Instruction]) -> Option<u64> {
        if !self.auto_priority_fee {
            return None;
        }
        let mut writable: Vec<Pubkey> = instructions
            .iter()
            .flat_map(|ix| ix.accounts.iter())
            .filter(|meta| meta.is_writable)
            .map(|meta| meta.pubkey)
            .collect();
        writable.sort_unstable();
        writable.dedup();

        match fees::estimate_priority_fee(&self.provider, &writable).await {
            Ok(0) => None,
            Ok(fee) => Some(fee),
            Err(error) => {
                warn!(error = %error, "Priority fee estimation failed, submitting without a bid");
                None
            }
        }
    }

    // Operations. Each validates synchronously, resolves pool and config
    // state, computes amounts, assembles instructions and submits.

    pub async fn create_pool(
        &self,
        params: ops::CreatePoolParams,
    ) -> Result<ops::CreatePoolResult, OperationError> {
        ops::create_pool::run(self, params).await
    }

    pub async fn add_liquidity(
        &self,
        params: ops::AddLiquidityParams,
    ) -> Result<ops::AddLiquidityResult, OperationError> {
        ops::add_liquidity::run(self, params).await
    }

    pub async fn remove_liquidity(
        &self,
        params: ops::RemoveLiquidityParams,
    ) -> Result<ops::RemoveLiquidityResult, OperationError> {
        ops::remove_liquidity::run(self, params).await
    }

    pub async fn swap_exact_in(
        &self,
        params: ops::SwapExactInParams,
    ) -> Result<ops::SwapResult, OperationError> {
        ops::swap::exact_in(self, params).await
    }

    pub async fn swap_exact_out(
        &self,
        params: ops::SwapExactOutParams,
    ) -> Result<ops::SwapResult, OperationError> {
        ops::swap::exact_out(self, params).await
    }

    pub async fn lock_liquidity(
        &self,
        params: ops::LockLiquidityParams,
    ) -> Result<ops::LockLiquidityResult, OperationError> {
        ops::lock::run(self, params).await
    }

    pub async fn harvest_lock(
        &self,
        params: ops::HarvestLockParams,
    ) -> Result<ops::HarvestLockResult, OperationError> {
        ops::harvest::run(self, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use solana_sdk::signature::Keypair;

    fn context() -> ClientContext {
        ClientContext::new(ClientConfig::for_cluster(Cluster::Devnet)).unwrap()
    }

    fn signed_context() -> ClientContext {
        context().with_signer(Arc::new(Keypair::new()))
    }

    fn swap_params() -> ops::SwapExactInParams {
        ops::SwapExactInParams {
            pool_id: None,
            input_mint: Pubkey::new_unique(),
            amount_in: dec!(1),
            slippage_bps: 50,
            base_in: None,
        }
    }

    #[tokio::test]
    async fn operations_require_a_signer() {
        let ctx = context();
        let err = ctx.swap_exact_in(swap_params()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingSigner);
        assert_eq!(err.operation, "swap_exact_in");
    }

    #[tokio::test]
    async fn slippage_is_validated_before_any_network_call() {
        let ctx = signed_context();
        let mut params = swap_params();
        params.slippage_bps = 0;
        let err = ctx.swap_exact_in(params).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSlippageRange);

        let err = ctx
            .remove_liquidity(ops::RemoveLiquidityParams {
                pool_id: None,
                lp_amount: None,
                slippage_bps: 10_001,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSlippageRange);
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected_synchronously() {
        let ctx = signed_context();
        let mut params = swap_params();
        params.amount_in = dec!(0);
        let err = ctx.swap_exact_in(params).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
    }

    #[tokio::test]
    async fn create_pool_requires_distinct_mints() {
        let ctx = signed_context();
        let mint = Pubkey::new_unique();
        let err = ctx
            .create_pool(ops::CreatePoolParams {
                mint_a: mint,
                mint_b: mint,
                amount_a: dec!(1),
                amount_b: dec!(1),
                start_time: None,
                fee_config_index: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidMintAddresses);
    }

    #[test]
    fn context_construction_needs_no_network() {
        for cluster in [Cluster::Mainnet, Cluster::Devnet] {
            assert!(ClientContext::new(ClientConfig::for_cluster(cluster)).is_ok());
        }
    }
}
