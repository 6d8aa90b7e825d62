//! Prelude module for convenient imports.
//!
//! Re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use cpmm_execution::prelude::*;
//! ```

// Context
pub use crate::context::{ClientConfig, ClientContext};

// Operations
pub use crate::ops::{
    AddLiquidityParams, AddLiquidityResult, CreatePoolParams, CreatePoolResult, HarvestLockParams,
    HarvestLockResult, LockLiquidityParams, LockLiquidityResult, RemoveLiquidityParams,
    RemoveLiquidityResult, SwapExactInParams, SwapExactOutParams, SwapResult,
};

// Transaction
pub use crate::transaction::{DynSigner, OperationResult, TransactionExecutor};

// Connection
pub use crate::connection::{
    ConnectionMonitor, ConnectionState, ConnectionStatus, DEFAULT_MAX_RETRIES, HealthProbe,
};

// Config cache
pub use crate::config_cache::{
    ConfigCache, DEFAULT_CONFIG_TTL, FeeConfigSource, IndexFeeConfigSource,
};

// Batch
pub use crate::batch::{BatchConfig, BatchOutcome, run_batched};

// Fees
pub use crate::fees::{MAX_FEE_SAMPLES, average_top_fees, estimate_priority_fee};
