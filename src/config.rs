//! Configuration types for node-stats
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use crate::walker::queue::DEFAULT_QUEUE_CAPACITY;
use clap::Parser;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Minimum queue size
const MIN_QUEUE_SIZE: usize = 1;

/// Node statistics over a tree store
#[derive(Parser, Debug, Clone)]
#[command(
    name = "node-stats",
    version,
    about = "Distributional statistics over every node of a tree store",
    long_about = "Walks every node below PATH in the tree store at STORE and prints, for\n\
                  each of eight per-node and per-item statistics, the count, maximum, sum,\n\
                  mean and a histogram with buckets of width 100.\n\n\
                  A directory store maps directories to nodes, sub-directories to children\n\
                  and regular files to properties.",
    after_help = "EXAMPLES:\n    \
        node-stats ./repository\n    \
        node-stats ./repository /content/dam -w 8\n    \
        node-stats ./repository --strict -q > stats.txt"
)]
pub struct CliArgs {
    /// Tree store to read
    #[arg(value_name = "STORE")]
    pub store: PathBuf,

    /// Node to start from
    #[arg(value_name = "PATH", default_value = "/")]
    pub path: String,

    /// Number of worker threads
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Work queue size (controls memory usage)
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, value_name = "NUM")]
    pub queue_size: usize,

    /// Fail the run if any node could not be processed
    #[arg(long)]
    pub strict: bool,

    /// Quiet mode - suppress progress and summary output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// All cores but one, the remaining one being left to the traversal
pub fn default_workers() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Tree store location
    pub store_path: PathBuf,

    /// Node path inside the store
    pub node_path: String,

    /// Number of worker threads
    pub worker_count: usize,

    /// Work queue capacity
    pub queue_size: usize,

    /// Treat processing failures as fatal
    pub strict: bool,

    /// Show progress indicator and summary
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("."),
            node_path: "/".to_string(),
            worker_count: default_workers(),
            queue_size: DEFAULT_QUEUE_CAPACITY,
            strict: false,
            show_progress: false,
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.queue_size < MIN_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: args.queue_size,
                min: MIN_QUEUE_SIZE,
            });
        }

        Ok(Self {
            store_path: args.store,
            node_path: args.path,
            worker_count: args.workers,
            queue_size: args.queue_size,
            strict: args.strict,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}
