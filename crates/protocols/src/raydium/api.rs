//! Client for the off-chain pool index.
//!
//! Mainnet pools are discoverable through an HTTP index that serves pool
//! metadata, reserves and rolling volume. Clusters without an index fall
//! back to direct on-chain reads in the locator.

use anyhow::{Context, Result, bail};
use cpmm_domain::enums::{Cluster, PoolSortBy};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::state::FeeConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Envelope common to every index response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// One page of a pool search.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPoolPage {
    pub count: u64,
    pub data: Vec<ApiPoolInfo>,
}

/// Mint descriptor as served by the index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMint {
    pub address: String,
    pub program_id: String,
    pub decimals: u8,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Rolling day statistics.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDayStats {
    pub volume: f64,
}

/// Fee/curve config tier as served by the index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCpmmConfig {
    pub id: String,
    pub index: u16,
    pub trade_fee_rate: u64,
    pub protocol_fee_rate: u64,
    pub fund_fee_rate: u64,
    #[serde(default)]
    pub create_pool_fee: Option<String>,
}

impl ApiCpmmConfig {
    /// Converts to the typed fee config.
    pub fn to_fee_config(&self) -> Result<FeeConfig> {
        Ok(FeeConfig {
            id: Pubkey::from_str(&self.id)
                .with_context(|| format!("Invalid config id {}", self.id))?,
            index: self.index,
            trade_fee_rate: self.trade_fee_rate,
            protocol_fee_rate: self.protocol_fee_rate,
            fund_fee_rate: self.fund_fee_rate,
            create_pool_fee: self
                .create_pool_fee
                .as_deref()
                .map(|fee| fee.parse::<u64>())
                .transpose()
                .context("Invalid createPoolFee")?
                .unwrap_or(0),
        })
    }
}

/// Pool info entry as served by the index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPoolInfo {
    pub id: String,
    pub program_id: String,
    pub mint_a: ApiMint,
    pub mint_b: ApiMint,
    pub lp_mint: ApiMint,
    pub mint_amount_a: f64,
    pub mint_amount_b: f64,
    /// Trade fee as a fraction (0.0025 = 25 bps).
    pub fee_rate: f64,
    pub tvl: f64,
    #[serde(default)]
    pub lp_amount: Option<f64>,
    #[serde(default)]
    pub day: Option<ApiDayStats>,
    #[serde(default)]
    pub config: Option<ApiCpmmConfig>,
}

impl ApiPoolInfo {
    /// Value of the sort criterion for best-pool selection.
    pub fn sort_metric(&self, sort_by: PoolSortBy) -> f64 {
        match sort_by {
            PoolSortBy::Liquidity => self.tvl,
            PoolSortBy::Volume24h => self.day.as_ref().map(|d| d.volume).unwrap_or(0.0),
        }
    }
}

/// HTTP client for the pool index.
pub struct IndexClient {
    http: reqwest::Client,
    base_url: String,
}

impl IndexClient {
    /// Creates a client for the cluster's index deployment.
    pub fn new(cluster: Cluster) -> Self {
        Self::with_base_url(cluster.index_base_url())
    }

    /// Creates a client against an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Pool info for explicit pool ids. Unknown ids come back as `None`.
    pub async fn pools_by_ids(&self, ids: &[Pubkey]) -> Result<Vec<Option<ApiPoolInfo>>> {
        let joined = ids
            .iter()
            .map(Pubkey::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/pools/info/ids", self.base_url);
        debug!(ids = %joined, "Fetching pools by id");
        let response: ApiResponse<Vec<Option<ApiPoolInfo>>> = self
            .get_json(self.http.get(&url).query(&[("ids", joined.as_str())]))
            .await?;
        Ok(response.data)
    }

    /// Standard pools containing the given mint pair, index-sorted by the
    /// criterion, best first.
    pub async fn pools_by_mint_pair(
        &self,
        mint_1: &Pubkey,
        mint_2: &Pubkey,
        sort_by: PoolSortBy,
        page_size: u16,
    ) -> Result<Vec<ApiPoolInfo>> {
        let url = format!("{}/pools/info/mint", self.base_url);
        debug!(mint_1 = %mint_1, mint_2 = %mint_2, "Searching pools by mint pair");
        let response: ApiResponse<ApiPoolPage> = self
            .get_json(self.http.get(&url).query(&[
                ("mint1", mint_1.to_string().as_str()),
                ("mint2", mint_2.to_string().as_str()),
                ("poolType", "Standard"),
                ("poolSortField", sort_by.api_field()),
                ("sortType", "desc"),
                ("pageSize", page_size.to_string().as_str()),
                ("page", "1"),
            ]))
            .await?;
        Ok(response.data.data)
    }

    /// All fee/curve config tiers.
    pub async fn cpmm_configs(&self) -> Result<Vec<FeeConfig>> {
        let url = format!("{}/main/cpmm-config", self.base_url);
        let response: ApiResponse<Vec<ApiCpmmConfig>> =
            self.get_json(self.http.get(&url)).await?;
        response
            .data
            .iter()
            .map(ApiCpmmConfig::to_fee_config)
            .collect()
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ApiResponse<T>> {
        let response = request.send().await.context("Index request failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!("index returned HTTP {status}");
        }
        let parsed: ApiResponse<T> = response
            .json()
            .await
            .context("Failed to decode index response")?;
        if !parsed.success {
            bail!("index reported failure");
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL_JSON: &str = r#"{
        "success": true,
        "data": {
            "count": 1,
            "data": [{
                "id": "2SNwf41oZyqVyCuX6PtZCenCnTWzsDR2bcqQzMPyp1NQ",
                "programId": "CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C",
                "mintA": {"address": "So11111111111111111111111111111111111111112", "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", "decimals": 9, "symbol": "WSOL"},
                "mintB": {"address": "5DhEM7PZrPVPfA4UK3tcNxxZ8UGwc6yFYwpAXB14uw2t", "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", "decimals": 6},
                "lpMint": {"address": "7YttLkHDoNj9wyDur5pM1ejNaAvT9X4eqaYcHQqtj2G5", "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", "decimals": 9},
                "mintAmountA": 12.5,
                "mintAmountB": 25000.0,
                "feeRate": 0.0025,
                "tvl": 4321.5,
                "lpAmount": 100.0,
                "day": {"volume": 987.25}
            }]
        }
    }"#;

    #[test]
    fn pool_page_parses() {
        let page: ApiResponse<ApiPoolPage> = serde_json::from_str(POOL_JSON).unwrap();
        assert!(page.success);
        let info = &page.data.data[0];
        assert_eq!(info.mint_a.decimals, 9);
        assert_eq!(info.fee_rate, 0.0025);
        assert_eq!(info.sort_metric(PoolSortBy::Liquidity), 4321.5);
        assert_eq!(info.sort_metric(PoolSortBy::Volume24h), 987.25);
    }

    #[test]
    fn config_converts_with_string_fee() {
        let config = ApiCpmmConfig {
            id: "7YttLkHDoNj9wyDur5pM1ejNaAvT9X4eqaYcHQqtj2G5".to_string(),
            index: 0,
            trade_fee_rate: 2_500,
            protocol_fee_rate: 120_000,
            fund_fee_rate: 40_000,
            create_pool_fee: Some("150000000".to_string()),
        };
        let fee_config = config.to_fee_config().unwrap();
        assert_eq!(fee_config.create_pool_fee, 150_000_000);
        assert_eq!(fee_config.trade_fee_bps(), 25);
    }

    #[test]
    fn missing_day_stats_sort_to_zero() {
        let config: Result<Vec<_>, _> = serde_json::from_str::<ApiResponse<ApiPoolPage>>(POOL_JSON)
            .map(|r| r.data.data);
        let mut info = config.unwrap().remove(0);
        info.day = None;
        assert_eq!(info.sort_metric(PoolSortBy::Volume24h), 0.0);
    }
}
