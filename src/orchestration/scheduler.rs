//! # Batch Scheduler
//!
//! Fans out analysis executions across many (table, category) pairs under a
//! global concurrency cap and a shared rate gate. The scheduler is a pure
//! fan-out/fan-in: it holds no table-specific state, work items are
//! independent, and results stream back to the caller as they resolve so the
//! coordinator can report progress incrementally.

use crate::analysis::AnalysisExecutor;
use crate::orchestration::types::{AnalysisResult, WorkItem};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Shared minimum-spacing gate for upstream calls.
///
/// A single next-slot instant is advanced under a mutex, so the aggregate
/// call rate is bounded regardless of how many workers share the gate - this
/// is not a per-worker sleep.
#[derive(Debug)]
pub struct RateGate {
    interval: Duration,
    next_slot: tokio::sync::Mutex<tokio::time::Instant>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: tokio::sync::Mutex::new(tokio::time::Instant::now()),
        }
    }

    /// Wait until the next call slot. Concurrent waiters are serialized onto
    /// slots spaced `interval` apart.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = tokio::time::Instant::now();
            let slot = (*next).max(now);
            *next = slot + self.interval;
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

/// Scheduling parameters for one batch run
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Bounded worker pool size
    pub max_concurrent: usize,
    /// Number of tables grouped per batch
    pub batch_size: usize,
    /// Active quality threshold, forwarded to the executor's cache policy
    pub quality_threshold: f64,
}

/// Bounded-concurrency fan-out over (table, category) pairs
pub struct BatchScheduler {
    executor: Arc<AnalysisExecutor>,
}

impl BatchScheduler {
    pub fn new(executor: Arc<AnalysisExecutor>) -> Self {
        Self { executor }
    }

    /// Run all work items, streaming results back in completion order.
    ///
    /// Items are grouped into table batches; within a batch every pair runs
    /// under the shared semaphore. One item's failure or fallback never
    /// blocks or cancels others. Setting `cancelled` stops submission of new
    /// items immediately; in-flight executions finish and their results are
    /// still delivered.
    pub fn run(
        &self,
        items: Vec<WorkItem>,
        options: BatchOptions,
        cancelled: Arc<AtomicBool>,
    ) -> mpsc::Receiver<AnalysisResult> {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        let executor = self.executor.clone();

        tokio::spawn(async move {
            let semaphore = Arc::new(Semaphore::new(options.max_concurrent.max(1)));
            let batches = group_into_batches(items, options.batch_size.max(1));
            let batch_count = batches.len();

            for (index, batch) in batches.into_iter().enumerate() {
                if cancelled.load(Ordering::Acquire) {
                    info!(
                        remaining_batches = batch_count - index,
                        "Cancellation requested, stopping work submission"
                    );
                    break;
                }

                let mut tasks = JoinSet::new();
                for item in batch {
                    if cancelled.load(Ordering::Acquire) {
                        break;
                    }
                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let executor = executor.clone();
                    let tx = tx.clone();
                    let threshold = options.quality_threshold;
                    tasks.spawn(async move {
                        let result = executor
                            .execute(&item.table, item.category, threshold)
                            .await;
                        drop(permit);
                        // Receiver dropped means the caller stopped listening;
                        // nothing left to do with the result
                        let _ = tx.send(result).await;
                    });
                }

                while tasks.join_next().await.is_some() {}
                debug!(batch = index + 1, total = batch_count, "Batch drained");
            }
        });

        rx
    }
}

/// Group work items into batches of `batch_size` tables, preserving item
/// order. All categories for a table land in the same batch.
fn group_into_batches(items: Vec<WorkItem>, batch_size: usize) -> Vec<Vec<WorkItem>> {
    let mut table_order: Vec<String> = Vec::new();
    for item in &items {
        if !table_order.contains(&item.table.table_id) {
            table_order.push(item.table.table_id.clone());
        }
    }

    table_order
        .chunks(batch_size)
        .map(|tables| {
            items
                .iter()
                .filter(|item| tables.contains(&item.table.table_id))
                .cloned()
                .collect()
        })
        .collect()
}
