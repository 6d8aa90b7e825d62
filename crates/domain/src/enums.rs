use serde::{Deserialize, Serialize};

/// Solana network cluster.
///
/// A closed set so that cluster-specific branches are exhaustive matches;
/// adding a cluster is a compile-time event, not a silent string fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    Mainnet,
    Devnet,
}

impl Cluster {
    /// Cluster tag as used in RPC configuration and explorer URLs.
    pub fn name(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "mainnet-beta",
            Cluster::Devnet => "devnet",
        }
    }

    /// CP-Swap program deployed on this cluster.
    pub fn amm_program_id(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C",
            Cluster::Devnet => "CPMDWBwJDtYax9qW7AyRuVC19Cc4L4Vcy4n2BHAbHkCW",
        }
    }

    /// Liquidity locking program deployed on this cluster.
    pub fn lock_program_id(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "LockrWmn6K5twhz3y9w1dQERbmgSaRkfnTeTKbpofwE",
            Cluster::Devnet => "DLockwT7X7sxtLmGH9g5kmfcjaBtncdbUmi738m5bvQC",
        }
    }

    /// Account that collects the fixed pool-creation fee.
    pub fn create_pool_fee_receiver(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "DNXgeM9EiiaAbaWvwjHj9fQQLAX5ZsfHyvmYUNRAdNC8",
            Cluster::Devnet => "G11FKBRaAkHAKuLCgLM6K6NUc9rTjPAznRCjZifrTQe2",
        }
    }

    /// Whether an off-chain pool index is available for this cluster.
    pub fn has_index(&self) -> bool {
        match self {
            Cluster::Mainnet => true,
            Cluster::Devnet => false,
        }
    }

    /// Base URL of the off-chain pool index.
    pub fn index_base_url(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "https://api-v3.raydium.io",
            Cluster::Devnet => "https://api-v3-devnet.raydium.io",
        }
    }

    /// Default public RPC endpoint.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
        }
    }

    /// Fallback pool used when neither a pool id nor a mint pair is supplied.
    pub fn default_pool_id(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "2SNwf41oZyqVyCuX6PtZCenCnTWzsDR2bcqQzMPyp1NQ",
            Cluster::Devnet => "7YttLkHDoNj9wyDur5pM1ejNaAvT9X4eqaYcHQqtj2G5",
        }
    }

    /// Explorer URL for a transaction signature. Non-primary clusters carry
    /// a `?cluster=` suffix.
    pub fn explorer_tx_url(&self, signature: &str) -> String {
        match self {
            Cluster::Mainnet => format!("https://explorer.solana.com/tx/{signature}"),
            Cluster::Devnet => {
                format!("https://explorer.solana.com/tx/{signature}?cluster=devnet")
            }
        }
    }
}

/// Sort criterion for best-pool selection, descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolSortBy {
    /// Total pool liquidity.
    #[default]
    Liquidity,
    /// Trailing 24h volume.
    Volume24h,
}

impl PoolSortBy {
    /// Field name used by the off-chain index sort parameter.
    pub fn api_field(&self) -> &'static str {
        match self {
            PoolSortBy::Liquidity => "liquidity",
            PoolSortBy::Volume24h => "volume24h",
        }
    }
}

/// Which pool side the swap input occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    /// Input is the base (token 0) side.
    BaseIn,
    /// Input is the quote (token 1) side.
    QuoteIn,
}

/// Direction of a slippage bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlippageDirection {
    /// Minimum acceptable amount (outputs, withdrawals).
    Floor,
    /// Maximum amount the caller is willing to supply (deposits).
    Ceiling,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_url_carries_cluster_suffix_off_mainnet() {
        let url = Cluster::Devnet.explorer_tx_url("abc");
        assert_eq!(url, "https://explorer.solana.com/tx/abc?cluster=devnet");

        let url = Cluster::Mainnet.explorer_tx_url("abc");
        assert_eq!(url, "https://explorer.solana.com/tx/abc");
    }

    #[test]
    fn only_mainnet_has_an_index() {
        assert!(Cluster::Mainnet.has_index());
        assert!(!Cluster::Devnet.has_index());
    }

    #[test]
    fn program_ids_differ_per_cluster() {
        assert_ne!(
            Cluster::Mainnet.amm_program_id(),
            Cluster::Devnet.amm_program_id()
        );
        assert_ne!(
            Cluster::Mainnet.lock_program_id(),
            Cluster::Devnet.lock_program_id()
        );
    }
}
