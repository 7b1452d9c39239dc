//! node-stats - Distributional statistics over large hierarchical trees
//!
//! Walks every node of an externally stored tree and aggregates, across all
//! nodes, counts, sums, maxima, means and histograms of property counts,
//! name lengths, value sizes and child counts. The tree is never held in
//! memory as a whole: nodes stream from a single traversal thread through a
//! bounded queue to a pool of workers.
//!
//! # Statistics
//!
//! | Name | One value per |
//! |------|---------------|
//! | `properties` | node: number of properties |
//! | `property.names.length` | node: total property name length |
//! | `property.values.size` | node: total non-binary value size |
//! | `children` | node: number of children |
//! | `child.names.length` | node: total child name length |
//! | `single.property.names.length` | property: name length total before it |
//! | `single.property.values.size` | non-binary value: its size |
//! | `single.child.names.length` | child: its name length |
//!
//! # Example
//!
//! ```
//! use node_stats::tree::MemoryNode;
//!
//! let root = MemoryNode::builder()
//!     .child("a", MemoryNode::leaf())
//!     .child("bb", MemoryNode::builder().string("x", "hello").build())
//!     .build();
//!
//! let report = node_stats::run(root).unwrap();
//! assert_eq!(report.get("properties").unwrap().n, 3);
//! assert_eq!(report.get("children").unwrap().sum, 2);
//! ```
//!
//! ```bash
//! # Whole store
//! node-stats ./repository
//!
//! # Sub-tree, eight workers
//! node-stats ./repository /content/dam -w 8
//! ```

pub mod config;
pub mod error;
pub mod progress;
pub mod report;
pub mod stats;
pub mod tree;
pub mod walker;

pub use config::{CliArgs, RunConfig};
pub use error::{Result, StatsError, StoreError};
pub use stats::{Bucket, Statistics, StatisticsSnapshot};
pub use tree::TreeNode;
pub use walker::{StatsCoordinator, StatsReport};

/// Compute statistics for every node under `root` with default settings
pub fn run<N: TreeNode>(root: N) -> Result<StatsReport> {
    StatsCoordinator::new(RunConfig::default()).run(root)
}
