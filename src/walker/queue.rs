//! Bounded node queue with backpressure
//!
//! Carries discovered nodes from the traversal thread to the worker pool.
//! The traversal thread blocks when the queue is full, idle workers block
//! when it is empty. Nothing is ever dropped or delivered twice.
//!
//! The capacity only caps memory when discovery outruns processing; it has
//! no effect on the statistics.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024 * 1024;

/// Statistics for the node queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total nodes enqueued
    pub enqueued: AtomicU64,

    /// Total nodes dequeued
    pub dequeued: AtomicU64,

    /// Number of pushes that found the queue full and had to wait
    pub backpressure_events: AtomicU64,
}

impl QueueStats {
    /// Get number of dequeued nodes
    pub fn throughput(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Get backpressure event count
    pub fn backpressure_count(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }
}

/// Bounded FIFO of nodes awaiting processing
pub struct NodeQueue<N> {
    sender: Sender<N>,
    receiver: Receiver<N>,
    stats: Arc<QueueStats>,
}

impl<N> NodeQueue<N> {
    /// Create a new queue with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);

        Self {
            sender,
            receiver,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Split the queue into its producer and consumer handles
    ///
    /// Once every sender is dropped, receivers drain the remaining nodes and
    /// then report disconnection.
    pub fn split(self) -> (NodeSender<N>, NodeReceiver<N>) {
        let sender = NodeSender {
            sender: self.sender,
            stats: Arc::clone(&self.stats),
        };
        let receiver = NodeReceiver {
            receiver: self.receiver,
            stats: self.stats,
        };
        (sender, receiver)
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Producer handle
pub struct NodeSender<N> {
    sender: Sender<N>,
    stats: Arc<QueueStats>,
}

impl<N> Clone for NodeSender<N> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<N> NodeSender<N> {
    /// Push a node, blocking while the queue is full
    ///
    /// Returns the node back if every receiver is gone.
    pub fn push(&self, node: N) -> Result<(), N> {
        let node = match self.sender.try_send(node) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Err(TrySendError::Full(node)) => {
                self.stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
                node
            }
            Err(TrySendError::Disconnected(node)) => return Err(node),
        };

        self.sender.send(node).map_err(|e| e.into_inner())?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

/// Consumer handle (clone for each worker)
pub struct NodeReceiver<N> {
    receiver: Receiver<N>,
    stats: Arc<QueueStats>,
}

impl<N> Clone for NodeReceiver<N> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<N> NodeReceiver<N> {
    /// Pop a node, blocking while the queue is empty
    ///
    /// Returns `None` once the queue is empty and all senders are dropped.
    pub fn pop(&self) -> Option<N> {
        match self.receiver.recv() {
            Ok(node) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(node)
            }
            Err(_) => None,
        }
    }

    /// Try to pop a node without blocking
    pub fn try_pop(&self) -> Option<N> {
        match self.receiver.try_recv() {
            Ok(node) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(node)
            }
            Err(_) => None,
        }
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
