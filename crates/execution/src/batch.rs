//! Bounded-concurrency task batches.
//!
//! Work is partitioned into sequential batches of `concurrency` tasks;
//! each batch runs concurrently, per-task failures are captured rather
//! than aborting the batch, and a fixed delay between batches throttles
//! request rate.

use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Batch sizing and pacing.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Tasks run concurrently per batch.
    pub concurrency: usize,
    /// Pause between consecutive batches.
    pub inter_batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            inter_batch_delay: Duration::from_millis(300),
        }
    }
}

/// Aggregated batch outcome. `failed` keeps the original task index so
/// callers can retry or report precisely.
#[derive(Debug)]
pub struct BatchOutcome<T, E> {
    pub succeeded: Vec<T>,
    pub failed: Vec<(usize, E)>,
}

impl<T, E> BatchOutcome<T, E> {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Runs `tasks` in batches of `config.concurrency`.
pub async fn run_batched<T, E, Fut>(tasks: Vec<Fut>, config: &BatchConfig) -> BatchOutcome<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    let concurrency = config.concurrency.max(1);
    let total = tasks.len();
    let mut outcome = BatchOutcome {
        succeeded: Vec::new(),
        failed: Vec::new(),
    };

    let mut iter = tasks.into_iter().peekable();
    let mut index = 0usize;
    while iter.peek().is_some() {
        let batch: Vec<Fut> = iter.by_ref().take(concurrency).collect();
        debug!(
            batch_size = batch.len(),
            done = index,
            total,
            "Running task batch"
        );
        for result in join_all(batch).await {
            match result {
                Ok(value) => outcome.succeeded.push(value),
                Err(error) => outcome.failed.push((index, error)),
            }
            index += 1;
        }
        if iter.peek().is_some() {
            tokio::time::sleep(config.inter_batch_delay).await;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn failures_are_captured_per_task() {
        let tasks: Vec<_> = (0..7)
            .map(|i| async move {
                if i % 3 == 0 {
                    Err(format!("task {i} failed"))
                } else {
                    Ok(i)
                }
            })
            .collect();

        let outcome = run_batched(tasks, &BatchConfig::default()).await;
        assert_eq!(outcome.total(), 7);
        assert_eq!(outcome.succeeded, vec![1, 2, 4, 5]);
        let failed_indices: Vec<usize> = outcome.failed.iter().map(|(i, _)| *i).collect();
        assert_eq!(failed_indices, vec![0, 3, 6]);
        assert!(!outcome.is_complete_success());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_is_a_complete_success() {
        let tasks: Vec<std::future::Ready<Result<(), ()>>> = Vec::new();
        let outcome = run_batched(tasks, &BatchConfig::default()).await;
        assert!(outcome.is_complete_success());
        assert_eq!(outcome.total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_concurrency_is_clamped() {
        let config = BatchConfig {
            concurrency: 0,
            inter_batch_delay: Duration::from_millis(10),
        };
        let tasks: Vec<_> = (0..3).map(|i| async move { Ok::<_, ()>(i) }).collect();
        let outcome = run_batched(tasks, &config).await;
        assert_eq!(outcome.succeeded.len(), 3);
    }
}
