//! Transaction signing, submission and the shared result shape.

use chrono::{DateTime, Utc};
use cpmm_domain::enums::Cluster;
use cpmm_domain::error::{ErrorCode, OperationError};
use cpmm_protocols::rpc::RpcProvider;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use tracing::{debug, info};

/// Signer handle supplied by the wallet layer.
pub type DynSigner = Arc<dyn Signer + Send + Sync>;

/// Standardized outcome of a submitted operation.
#[derive(Debug, Clone)]
pub struct OperationResult {
    /// Confirmed transaction signature.
    pub signature: Signature,
    /// Pool the operation ran against.
    pub pool_id: Pubkey,
    /// Confirmation time, UTC.
    pub timestamp: DateTime<Utc>,
    /// Cluster the transaction landed on.
    pub cluster: Cluster,
    /// Explorer link for the transaction.
    pub explorer_url: String,
}

/// Signs and submits assembled instruction sets.
///
/// Performs no retry of its own: connectivity retry belongs to the
/// connection monitor, and business failures surface to the caller.
pub struct TransactionExecutor {
    provider: Arc<RpcProvider>,
    cluster: Cluster,
    simulate_first: bool,
    compute_unit_limit: Option<u32>,
}

impl TransactionExecutor {
    pub fn new(provider: Arc<RpcProvider>, cluster: Cluster) -> Self {
        Self {
            provider,
            cluster,
            simulate_first: false,
            compute_unit_limit: None,
        }
    }

    /// Enables a pre-flight simulation before submission.
    pub fn set_simulate_first(&mut self, simulate_first: bool) {
        self.simulate_first = simulate_first;
    }

    /// Caps compute units; also unlocks the priority-fee bid.
    pub fn set_compute_unit_limit(&mut self, limit: Option<u32>) {
        self.compute_unit_limit = limit;
    }

    /// Signs with the payer (plus any ephemeral signers), submits, and
    /// waits for confirmation at the provider's commitment level.
    ///
    /// A submitted transaction is irrevocable; callers racing this against
    /// a timer must treat a timeout as "outcome unknown".
    pub async fn execute(
        &self,
        operation: &'static str,
        instructions: Vec<Instruction>,
        payer: &DynSigner,
        extra_signers: &[&Keypair],
        pool_id: Pubkey,
        priority_fee_micro_lamports: Option<u64>,
    ) -> Result<OperationResult, OperationError> {
        let failed = |message: &str| {
            OperationError::new(operation, ErrorCode::TransactionExecutionFailed, message)
        };

        let mut all = Vec::with_capacity(instructions.len() + 2);
        if let Some(limit) = self.compute_unit_limit {
            all.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));
        }
        if let Some(price) = priority_fee_micro_lamports {
            all.push(ComputeBudgetInstruction::set_compute_unit_price(price));
        }
        all.extend(instructions);

        let blockhash = self
            .provider
            .get_latest_blockhash()
            .await
            .map_err(|e| failed("failed to fetch a recent blockhash").with_cause(cause(e)))?;

        let mut transaction = Transaction::new_with_payer(&all, Some(&payer.pubkey()));
        let mut signers: Vec<&dyn Signer> = Vec::with_capacity(1 + extra_signers.len());
        signers.push(payer.as_ref());
        signers.extend(extra_signers.iter().map(|keypair| *keypair as &dyn Signer));
        transaction
            .try_sign(&signers, blockhash)
            .map_err(|e| failed("signing failed").with_cause(cause(anyhow::Error::from(e))))?;

        if self.simulate_first {
            debug!(instructions = all.len(), "Simulating before submission");
            let simulation = self
                .provider
                .simulate(&transaction)
                .await
                .map_err(|e| failed("simulation request failed").with_cause(cause(e)))?;
            if let Some(simulation_error) = simulation {
                return Err(failed(&format!("simulation failed: {simulation_error}")));
            }
        }

        let signature = self
            .provider
            .send_and_confirm(&transaction)
            .await
            .map_err(|e| failed("submission failed").with_cause(cause(e)))?;

        let explorer_url = self.cluster.explorer_tx_url(&signature.to_string());
        info!(
            operation,
            signature = %signature,
            pool = %pool_id,
            "Transaction confirmed"
        );

        Ok(OperationResult {
            signature,
            pool_id,
            timestamp: Utc::now(),
            cluster: self.cluster,
            explorer_url,
        })
    }
}

fn cause(e: anyhow::Error) -> Box<dyn std::error::Error + Send + Sync> {
    e.into()
}
