//! Run coordinator - orchestrates a statistics run
//!
//! The coordinator is responsible for:
//! - Setting up the queue, the completion detector and the workers
//! - Running the traversal on its own thread
//! - Waiting for completion while reporting progress
//! - Shutting the workers down and collecting the final statistics
//!
//! A traversal failure aborts the run: the producer side of the queue is
//! dropped, the workers drain what was already queued and exit, and no
//! statistics are returned.

use crate::config::RunConfig;
use crate::error::{Result, StatsError, WorkerError};
use crate::progress::ProgressReporter;
use crate::stats::StatisticsSnapshot;
use crate::tree::TreeNode;
use crate::walker::metrics::NodeStatistics;
use crate::walker::pending::CompletionDetector;
use crate::walker::queue::{NodeQueue, NodeSender, QueueStats};
use crate::walker::traversal::traverse;
use crate::walker::worker::{PoolTotals, WorkerPool};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the waiting thread wakes up to refresh progress
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a run that is not part of the statistics themselves
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Nodes found by the traversal
    pub nodes_discovered: u64,

    /// Nodes whose metrics were recorded
    pub nodes_processed: u64,

    /// Nodes whose metrics were dropped
    pub failed_nodes: u64,

    /// Times the traversal had to wait for a full queue
    pub backpressure_events: u64,

    /// Workers used
    pub workers: usize,

    /// Wall time of the run
    pub duration: Duration,
}

/// Final statistics of a completed run
#[derive(Debug, Clone)]
pub struct StatsReport {
    /// Snapshots of the eight accumulators, in report order
    pub statistics: Vec<(&'static str, StatisticsSnapshot)>,

    pub summary: RunSummary,
}

impl StatsReport {
    /// Look up a statistic by name
    pub fn get(&self, name: &str) -> Option<&StatisticsSnapshot> {
        self.statistics
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, snapshot)| snapshot)
    }
}

/// Progress information for display
#[derive(Debug, Clone, Default)]
pub struct RunProgress {
    /// Nodes discovered so far
    pub discovered: u64,

    /// Nodes processed so far
    pub processed: u64,

    /// Current queue size
    pub queue_size: usize,

    /// Total workers
    pub total_workers: usize,

    /// Elapsed time
    pub elapsed: Duration,
}

impl RunProgress {
    /// Calculate processed nodes per second
    pub fn nodes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Coordinates traversal, workers and completion detection
pub struct StatsCoordinator {
    /// Configuration
    config: Arc<RunConfig>,

    /// Shutdown signal
    shutdown: Arc<AtomicBool>,

    /// Optional progress display
    progress: Option<ProgressReporter>,
}

impl StatsCoordinator {
    /// Create a new coordinator
    pub fn new(config: RunConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    /// Display progress while the run is in flight
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Compute statistics for every node under `root`
    ///
    /// Blocks until the whole tree has been discovered and processed.
    pub fn run<N: TreeNode>(&self, root: N) -> Result<StatsReport> {
        let start = Instant::now();

        info!(
            workers = self.config.worker_count,
            queue_size = self.config.queue_size,
            "Starting statistics run"
        );

        let detector = Arc::new(CompletionDetector::new());
        let statistics = Arc::new(NodeStatistics::new());
        let queue = NodeQueue::new(self.config.queue_size);
        let queue_stats = queue.stats();
        let (sender, receiver) = queue.split();

        let pool = WorkerPool::spawn(self.config.worker_count, receiver, &detector, &statistics)?;
        let traversal = self.spawn_traversal(root, &detector, sender.clone())?;

        let mut run = InFlight {
            sender: Some(sender),
            traversal: Some(traversal),
            pool: Some(pool),
            discovered: None,
        };

        if let Err(e) = self.wait_for_completion(&mut run, &detector, &queue_stats, start) {
            run.abort();
            if let Some(p) = &self.progress {
                p.finish_and_clear();
            }
            return Err(e);
        }

        let (discovered, totals) = run.finish()?;
        debug_assert_eq!(detector.registered(), detector.completed());

        let summary = RunSummary {
            nodes_discovered: discovered,
            nodes_processed: totals.processed,
            failed_nodes: totals.failed,
            backpressure_events: queue_stats.backpressure_count(),
            workers: self.config.worker_count,
            duration: start.elapsed(),
        };

        info!(
            nodes = summary.nodes_discovered,
            failed = summary.failed_nodes,
            backpressure = summary.backpressure_events,
            duration_ms = summary.duration.as_millis() as u64,
            "Run completed"
        );

        if let Some(p) = &self.progress {
            p.finish_and_clear();
        }

        if self.config.strict && summary.failed_nodes > 0 {
            return Err(StatsError::ProcessingFailed {
                failed: summary.failed_nodes,
            });
        }

        Ok(StatsReport {
            statistics: statistics.snapshot(),
            summary,
        })
    }

    fn spawn_traversal<N: TreeNode>(
        &self,
        root: N,
        detector: &Arc<CompletionDetector>,
        sender: NodeSender<N>,
    ) -> Result<JoinHandle<Result<u64>>> {
        let detector = Arc::clone(detector);
        let shutdown = Arc::clone(&self.shutdown);
        let name = "node-stats-traversal".to_string();

        thread::Builder::new()
            .name(name.clone())
            .spawn(move || traverse(root, &detector, &sender, &shutdown))
            .map_err(|e| {
                StatsError::Worker(WorkerError::SpawnFailed {
                    name,
                    reason: e.to_string(),
                })
            })
    }

    /// Wait for the completion signal, watching for traversal failure and
    /// interruption
    fn wait_for_completion<N>(
        &self,
        run: &mut InFlight<N>,
        detector: &CompletionDetector,
        queue_stats: &QueueStats,
        start: Instant,
    ) -> Result<()> {
        loop {
            if detector.wait_timeout(PROGRESS_INTERVAL) {
                return Ok(());
            }

            if self.shutdown.load(Ordering::Relaxed) {
                info!("Shutdown signal received");
                return Err(StatsError::Interrupted);
            }

            if run.traversal.as_ref().is_some_and(|t| t.is_finished()) {
                run.join_traversal()?;
            }

            if let Some(p) = &self.progress {
                p.update(&RunProgress {
                    discovered: detector.registered(),
                    processed: detector.completed(),
                    queue_size: run.queue_len(queue_stats),
                    total_workers: self.config.worker_count,
                    elapsed: start.elapsed(),
                });
            }
        }
    }
}

/// Threads and handles of a run that has not been torn down yet
struct InFlight<N> {
    sender: Option<NodeSender<N>>,
    traversal: Option<JoinHandle<Result<u64>>>,
    pool: Option<WorkerPool>,
    discovered: Option<u64>,
}

impl<N> InFlight<N> {
    fn queue_len(&self, queue_stats: &QueueStats) -> usize {
        match &self.sender {
            Some(sender) => sender.len(),
            None => {
                let enqueued = queue_stats.enqueued.load(Ordering::Relaxed);
                enqueued.saturating_sub(queue_stats.throughput()) as usize
            }
        }
    }

    fn join_traversal(&mut self) -> Result<()> {
        if let Some(handle) = self.traversal.take() {
            let discovered = handle
                .join()
                .map_err(|_| StatsError::Worker(WorkerError::TraversalPanicked))??;
            debug!(discovered, "Traversal thread joined");
            self.discovered = Some(discovered);
        }
        Ok(())
    }

    /// Disconnect the queue and join every thread
    fn finish(mut self) -> Result<(u64, PoolTotals)> {
        self.join_traversal()?;
        self.sender.take();

        let totals = match self.pool.take() {
            Some(pool) => pool.join()?,
            None => PoolTotals::default(),
        };
        Ok((self.discovered.unwrap_or_default(), totals))
    }

    /// Tear down after a failure; errors here are only logged
    fn abort(&mut self) {
        self.sender.take();

        if let Some(handle) = self.traversal.take() {
            match handle.join() {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => debug!(error = %e, "Traversal ended during abort"),
                Err(_) => warn!("Traversal thread panicked during abort"),
            }
        }

        if let Some(pool) = self.pool.take() {
            if let Err(e) = pool.join() {
                warn!(error = %e, "Workers failed to stop cleanly");
            }
        }
    }
}
