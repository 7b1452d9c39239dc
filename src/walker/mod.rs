//! Concurrent traversal and aggregation engine
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │     Traversal thread     │
//!                 │  depth-first, post-order │
//!                 │  register → push         │
//!                 └────────────┬─────────────┘
//!                              │
//!                              ▼
//!                 ┌──────────────────────────┐
//!                 │   Node queue (bounded)   │
//!                 │  crossbeam, backpressure │
//!                 └────────────┬─────────────┘
//!                              │
//!       ┌──────────────────────┼──────────────────────┐
//!       │                      │                      │
//! ┌─────▼─────┐          ┌─────▼─────┐          ┌─────▼─────┐
//! │ Worker 1  │          │ Worker 2  │   ...    │ Worker N  │
//! │ metrics   │          │ metrics   │          │ metrics   │
//! └─────┬─────┘          └─────┬─────┘          └─────┬─────┘
//!       │                      │                      │
//!       └──────────────┬───────┴──────────────────────┘
//!                      ▼
//!       ┌──────────────────────────────┐    ┌─────────────────────┐
//!       │  8 shared accumulators       │    │ Completion detector │
//!       │  (atomics, lazy histogram)   │    │ pending → 0 → fire  │
//!       └──────────────────────────────┘    └─────────────────────┘
//! ```

pub mod coordinator;
pub mod metrics;
pub mod pending;
pub mod queue;
pub mod traversal;
pub mod worker;

pub use coordinator::{RunProgress, RunSummary, StatsCoordinator, StatsReport};
pub use metrics::{NodeMetrics, NodeStatistics, STATISTIC_NAMES};
pub use pending::{CompletionDetector, PendingGuard};
pub use queue::{NodeQueue, NodeReceiver, NodeSender, QueueStats};
pub use worker::{PoolTotals, WorkerPool};
