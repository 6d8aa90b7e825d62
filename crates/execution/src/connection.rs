//! Connection health state machine with bounded, capped backoff.

use async_trait::async_trait;
use cpmm_protocols::rpc::RpcProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default retry budget before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

const BACKOFF_BASE_MS: u64 = 1_000;
const BACKOFF_CAP_MS: u64 = 30_000;

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Initial probe in flight.
    Connecting,
    /// Endpoint healthy.
    Connected,
    /// Backoff retry in flight.
    Reconnecting,
    /// Last probe failed; retries remain.
    Error,
    /// Retry budget exhausted. Terminal until an external fresh check.
    Disconnected,
}

/// Observable connection state. `retry_count` never exceeds
/// `max_retries`, and `Disconnected` is only entered after exhausting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub last_error: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
}

/// Health probe seam; the RPC provider is the production implementation.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> Result<(), String>;
}

#[async_trait]
impl HealthProbe for RpcProvider {
    async fn probe(&self) -> Result<(), String> {
        self.get_health().await.map_err(|e| e.to_string())
    }
}

/// Maintains connection status against the RPC endpoint.
///
/// Reconnection is an explicit iterative loop with a bounded counter, so
/// the machine is observable and testable step by step.
pub struct ConnectionMonitor {
    probe: Arc<dyn HealthProbe>,
    state: RwLock<ConnectionState>,
}

impl ConnectionMonitor {
    pub fn new(probe: Arc<dyn HealthProbe>, max_retries: u32) -> Self {
        Self {
            probe,
            state: RwLock::new(ConnectionState {
                status: ConnectionStatus::Connecting,
                last_error: None,
                retry_count: 0,
                max_retries,
            }),
        }
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.state.read().await.status
    }

    /// Probes the endpoint. Success connects and resets the retry budget;
    /// failure enters the reconnect loop. A fresh call also resets the
    /// budget, which is the only way out of terminal `Disconnected`
    /// (e.g. after an endpoint change).
    pub async fn check_connection(&self) -> ConnectionStatus {
        {
            let mut state = self.state.write().await;
            state.status = ConnectionStatus::Connecting;
            state.retry_count = 0;
            state.last_error = None;
        }

        match self.probe.probe().await {
            Ok(()) => {
                self.mark_connected().await;
                ConnectionStatus::Connected
            }
            Err(error) => {
                warn!(error = %error, "Health check failed");
                {
                    let mut state = self.state.write().await;
                    state.status = ConnectionStatus::Error;
                    state.last_error = Some(error);
                }
                self.reconnect().await
            }
        }
    }

    /// Retries the probe with exponential backoff until it succeeds or the
    /// retry budget is exhausted, then settles in `Connected` or
    /// `Disconnected`.
    pub async fn reconnect(&self) -> ConnectionStatus {
        loop {
            let delay = {
                let mut state = self.state.write().await;
                if state.retry_count >= state.max_retries {
                    state.status = ConnectionStatus::Disconnected;
                    warn!(
                        retries = state.retry_count,
                        "Retry budget exhausted, disconnecting"
                    );
                    return ConnectionStatus::Disconnected;
                }
                let delay = backoff_delay(state.retry_count);
                state.status = ConnectionStatus::Reconnecting;
                state.retry_count += 1;
                debug!(
                    attempt = state.retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Reconnecting after backoff"
                );
                delay
            };

            tokio::time::sleep(delay).await;

            match self.probe.probe().await {
                Ok(()) => {
                    self.mark_connected().await;
                    return ConnectionStatus::Connected;
                }
                Err(error) => {
                    let mut state = self.state.write().await;
                    state.status = ConnectionStatus::Error;
                    state.last_error = Some(error);
                }
            }
        }
    }

    async fn mark_connected(&self) {
        let mut state = self.state.write().await;
        state.status = ConnectionStatus::Connected;
        state.retry_count = 0;
        state.last_error = None;
        info!("RPC endpoint healthy");
    }
}

/// `min(2^retry * 1s, 30s)`.
fn backoff_delay(retry_count: u32) -> Duration {
    let factor = 1u64 << retry_count.min(15);
    Duration::from_millis((BACKOFF_BASE_MS.saturating_mul(factor)).min(BACKOFF_CAP_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct ScriptedProbe {
        healthy: AtomicBool,
        failures_before_success: AtomicU32,
        calls: AtomicU32,
    }

    impl ScriptedProbe {
        fn failing() -> Self {
            Self {
                healthy: AtomicBool::new(false),
                failures_before_success: AtomicU32::new(u32::MAX),
                calls: AtomicU32::new(0),
            }
        }

        fn flaky(failures: u32) -> Self {
            Self {
                healthy: AtomicBool::new(false),
                failures_before_success: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn probe(&self) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                return Ok(());
            }
            let remaining = self.failures_before_success.load(Ordering::SeqCst);
            if remaining == 0 {
                self.healthy.store(true, Ordering::SeqCst);
                Ok(())
            } else {
                if remaining != u32::MAX {
                    self.failures_before_success
                        .store(remaining - 1, Ordering::SeqCst);
                }
                Err("probe failed".to_string())
            }
        }
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0), Duration::from_millis(1_000));
        assert_eq!(backoff_delay(1), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(2), Duration::from_millis(4_000));
        assert_eq!(backoff_delay(4), Duration::from_millis(16_000));
        assert_eq!(backoff_delay(5), Duration::from_millis(30_000));
        assert_eq!(backoff_delay(30), Duration::from_millis(30_000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_retries_disconnects() {
        let monitor = ConnectionMonitor::new(Arc::new(ScriptedProbe::failing()), 3);
        let status = monitor.check_connection().await;
        assert_eq!(status, ConnectionStatus::Disconnected);

        let state = monitor.state().await;
        assert_eq!(state.retry_count, 3);
        assert!(state.retry_count <= state.max_retries);
        assert!(state.last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_resets_the_retry_count() {
        // Fails the initial probe and the first retry, then recovers.
        let monitor = ConnectionMonitor::new(Arc::new(ScriptedProbe::flaky(2)), 5);
        let status = monitor.check_connection().await;
        assert_eq!(status, ConnectionStatus::Connected);

        let state = monitor.state().await;
        assert_eq!(state.retry_count, 0);
        assert!(state.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_check_leaves_terminal_disconnected() {
        let probe = Arc::new(ScriptedProbe::failing());
        let monitor = ConnectionMonitor::new(probe.clone(), 2);
        assert_eq!(
            monitor.check_connection().await,
            ConnectionStatus::Disconnected
        );

        // Endpoint comes back; only an external fresh check transitions out.
        probe.healthy.store(true, Ordering::SeqCst);
        assert_eq!(monitor.status().await, ConnectionStatus::Disconnected);
        assert_eq!(
            monitor.check_connection().await,
            ConnectionStatus::Connected
        );
        assert_eq!(monitor.state().await.retry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_probe_connects_immediately() {
        let probe = Arc::new(ScriptedProbe::flaky(0));
        let monitor = ConnectionMonitor::new(probe.clone(), 5);
        assert_eq!(
            monitor.check_connection().await,
            ConnectionStatus::Connected
        );
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }
}
