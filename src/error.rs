//! Error types for node-stats
//!
//! This module defines the error hierarchy for a statistics run:
//! - Tree store errors (opening the store, listing children or properties)
//! - Configuration and CLI errors
//! - Worker thread errors
//!
//! Store errors are never retried. The store is local and already open, so
//! every failure is treated as permanent.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for node-stats
#[derive(Error, Debug)]
pub enum StatsError {
    /// The tree store could not be opened or read
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// The requested start node does not exist in the store
    #[error("Node at path {path} does not exist")]
    NodeNotFound { path: String },

    /// Listing a node failed while the tree was being discovered
    #[error("Traversal failed: {source}")]
    Traversal {
        #[source]
        source: StoreError,
    },

    /// Some nodes could not be processed and the run was strict
    #[error("{failed} node(s) could not be processed")]
    ProcessingFailed { failed: u64 },

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,
}

/// Errors raised by a tree store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot be opened at all
    #[error("Cannot open store at '{path}': {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// Listing the children of a node failed
    #[error("Failed to list children of '{path}': {reason}")]
    ListChildren { path: String, reason: String },

    /// Listing the properties of a node failed
    #[error("Failed to list properties of '{path}': {reason}")]
    ListProperties { path: String, reason: String },

    /// Underlying I/O failure
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Traversal thread panicked
    #[error("Traversal thread panicked")]
    TraversalPanicked,

    /// Work queue send failed
    #[error("Failed to send work item: queue closed")]
    QueueSendFailed,

    /// Thread spawn failed
    #[error("Failed to spawn thread '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },
}

/// Result type alias for StatsError
pub type Result<T> = std::result::Result<T, StatsError>;

/// Result type alias for StoreError
pub type StoreResult<T> = std::result::Result<T, StoreError>;
