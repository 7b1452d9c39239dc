//! Worker threads computing per-node metrics
//!
//! Each worker:
//! - Pops a node from the queue
//! - Computes the node's metrics and feeds them into the shared accumulators
//! - Reports the node as complete, whatever the outcome
//!
//! Workers run until the queue is disconnected and drained.

use crate::error::WorkerError;
use crate::tree::TreeNode;
use crate::walker::metrics::{NodeMetrics, NodeStatistics};
use crate::walker::pending::{CompletionDetector, PendingGuard};
use crate::walker::queue::NodeReceiver;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Nodes whose metrics were recorded
    pub processed: AtomicU64,

    /// Nodes whose metrics were dropped because processing failed
    pub failed: AtomicU64,
}

impl WorkerStats {
    fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// A worker thread that processes nodes
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn<N: TreeNode>(
        id: usize,
        receiver: NodeReceiver<N>,
        detector: Arc<CompletionDetector>,
        statistics: Arc<NodeStatistics>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);
        let name = format!("node-stats-worker-{}", id);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(id, receiver, detector, statistics, stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                name,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                id: self.id,
                message: "Worker thread panicked".into(),
            }),
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop<N: TreeNode>(
    id: usize,
    receiver: NodeReceiver<N>,
    detector: Arc<CompletionDetector>,
    statistics: Arc<NodeStatistics>,
    stats: Arc<WorkerStats>,
) {
    debug!(worker = id, "Worker starting");

    while let Some(node) = receiver.pop() {
        let _guard = PendingGuard::new(&detector);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| NodeMetrics::compute(&node)));
        match outcome {
            Ok(Ok(metrics)) => {
                statistics.record(&metrics);
                stats.record_processed();
                trace!(worker = id, children = metrics.children, "Node processed");
            }
            Ok(Err(e)) => {
                stats.record_failure();
                warn!(worker = id, error = %e, "Node processing failed, metrics dropped");
            }
            Err(_) => {
                stats.record_failure();
                warn!(worker = id, "Node processing panicked, metrics dropped");
            }
        }
    }

    debug!(
        worker = id,
        processed = stats.processed.load(Ordering::Relaxed),
        failed = stats.failed.load(Ordering::Relaxed),
        "Worker shutting down"
    );
}

/// Totals across all workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolTotals {
    pub processed: u64,
    pub failed: u64,
}

/// Fixed set of workers sharing one queue
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Spawn `count` workers
    pub fn spawn<N: TreeNode>(
        count: usize,
        receiver: NodeReceiver<N>,
        detector: &Arc<CompletionDetector>,
        statistics: &Arc<NodeStatistics>,
    ) -> Result<Self, WorkerError> {
        let mut workers = Vec::with_capacity(count);
        for id in 0..count {
            workers.push(Worker::spawn(
                id,
                receiver.clone(),
                Arc::clone(detector),
                Arc::clone(statistics),
            )?);
        }

        info!(count = workers.len(), "Workers spawned");
        Ok(Self { workers })
    }

    /// Number of workers
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Join all workers. The queue must be disconnected first.
    pub fn join(self) -> Result<PoolTotals, WorkerError> {
        let totals = aggregate_stats(&self.workers);
        let mut first_error = None;

        for worker in self.workers {
            if let Err(e) = worker.join() {
                warn!(error = %e, "Worker failed to join cleanly");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(totals),
        }
    }
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(workers: &[Worker]) -> PoolTotals {
    workers.iter().fold(PoolTotals::default(), |acc, worker| PoolTotals {
        processed: acc.processed + worker.stats.processed.load(Ordering::Relaxed),
        failed: acc.failed + worker.stats.failed.load(Ordering::Relaxed),
    })
}
