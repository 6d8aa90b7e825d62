//! RPC provider over the nonblocking Solana client.

use anyhow::{Context, Result, bail};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::account::Account;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tracing::debug;

/// Balance of a single token account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    /// Mint the account holds.
    pub mint: Pubkey,
    /// Raw amount in the mint's smallest unit.
    pub amount: u64,
}

/// Decimals and owning program of a mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintInfo {
    pub decimals: u8,
    pub program: Pubkey,
}

/// Thin async wrapper around the RPC client, shared by every component
/// that reads chain state or submits transactions.
pub struct RpcProvider {
    client: RpcClient,
    commitment: CommitmentConfig,
    url: String,
}

impl RpcProvider {
    /// Creates a provider for the given endpoint and commitment level.
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        let url = url.into();
        Self {
            client: RpcClient::new_with_commitment(url.clone(), commitment),
            commitment,
            url,
        }
    }

    /// Endpoint URL this provider talks to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Commitment level used for reads and confirmation.
    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    /// Lightweight health probe of the endpoint.
    pub async fn get_health(&self) -> Result<()> {
        self.client
            .get_health()
            .await
            .context("RPC health check failed")
    }

    pub async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .context("Failed to get recent blockhash")
    }

    pub async fn get_slot(&self) -> Result<u64> {
        self.client.get_slot().await.context("Failed to get slot")
    }

    /// Fetches an account, `None` when it does not exist.
    pub async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .with_context(|| format!("Failed to fetch account {address}"))?;
        Ok(response.value)
    }

    /// Whether an account exists at the given address.
    pub async fn account_exists(&self, address: &Pubkey) -> Result<bool> {
        Ok(self.get_account(address).await?.is_some())
    }

    /// Reads a token account balance, `None` when the account does not
    /// exist. Token-2022 accounts carry extension bytes past the base
    /// layout, so only the base prefix is unpacked.
    pub async fn token_balance(&self, token_account: &Pubkey) -> Result<Option<TokenBalance>> {
        let Some(account) = self.get_account(token_account).await? else {
            return Ok(None);
        };
        let len = spl_token::state::Account::LEN;
        if account.data.len() < len {
            bail!("account {token_account} is not a token account");
        }
        let parsed = spl_token::state::Account::unpack_unchecked(&account.data[..len])
            .with_context(|| format!("Failed to unpack token account {token_account}"))?;
        Ok(Some(TokenBalance {
            mint: parsed.mint,
            amount: parsed.amount,
        }))
    }

    /// Reads a mint's decimal precision and owning token program.
    pub async fn mint_info(&self, mint: &Pubkey) -> Result<MintInfo> {
        let account = self
            .get_account(mint)
            .await?
            .with_context(|| format!("Mint {mint} does not exist"))?;
        let len = spl_token::state::Mint::LEN;
        if account.data.len() < len {
            bail!("account {mint} is not a mint");
        }
        let parsed = spl_token::state::Mint::unpack_unchecked(&account.data[..len])
            .with_context(|| format!("Failed to unpack mint {mint}"))?;
        Ok(MintInfo {
            decimals: parsed.decimals,
            program: account.owner,
        })
    }

    /// Recent prioritization fee samples over the given writable accounts.
    pub async fn recent_prioritization_fees(&self, writable: &[Pubkey]) -> Result<Vec<u64>> {
        let fees = self
            .client
            .get_recent_prioritization_fees(writable)
            .await
            .context("Failed to fetch recent prioritization fees")?;
        Ok(fees.into_iter().map(|f| f.prioritization_fee).collect())
    }

    /// Simulates a signed transaction. Returns `Some(description)` when the
    /// simulation reports an error, `None` on success.
    pub async fn simulate(&self, transaction: &Transaction) -> Result<Option<String>> {
        let result = self
            .client
            .simulate_transaction(transaction)
            .await
            .context("Failed to simulate transaction")?;
        match result.value.err {
            Some(err) => {
                let logs = result.value.logs.unwrap_or_default().join("\n");
                Ok(Some(format!("{err}: {logs}")))
            }
            None => Ok(None),
        }
    }

    /// Submits a signed transaction and waits for confirmation at this
    /// provider's commitment level.
    pub async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature> {
        debug!("Sending transaction");
        self.client
            .send_and_confirm_transaction(transaction)
            .await
            .context("Failed to send transaction")
    }
}
