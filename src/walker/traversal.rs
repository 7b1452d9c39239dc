//! Depth-first discovery of the tree
//!
//! Every node is registered with the [`CompletionDetector`] when it is first
//! visited and pushed onto the queue only after its whole subtree has been
//! pushed. The walk uses an explicit stack, so tree depth is bounded by heap
//! rather than by the thread's stack.

use crate::error::{Result, StatsError, StoreError, WorkerError};
use crate::tree::{ChildEntry, TreeNode};
use crate::walker::pending::CompletionDetector;
use crate::walker::queue::NodeSender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::vec;
use tracing::{debug, error};

struct Frame<N> {
    node: N,
    children: vec::IntoIter<ChildEntry<N>>,
}

impl<N: TreeNode> Frame<N> {
    /// Register `node` and list its children
    fn enter(node: N, detector: &CompletionDetector) -> Result<Self> {
        detector.register();
        let children = node.children().map_err(traversal_failed)?;
        Ok(Self {
            node,
            children: children.into_iter(),
        })
    }
}

fn traversal_failed(source: StoreError) -> StatsError {
    error!(error = %source, "Traversal failed");
    StatsError::Traversal { source }
}

/// Walk the tree under `root`, feeding every node into `queue`
///
/// Returns the number of nodes discovered. Any store error aborts the walk;
/// nodes already pushed stay in the queue.
pub fn traverse<N: TreeNode>(
    root: N,
    detector: &CompletionDetector,
    queue: &NodeSender<N>,
    shutdown: &AtomicBool,
) -> Result<u64> {
    let mut discovered = 1u64;
    let mut stack = vec![Frame::enter(root, detector)?];

    while let Some(frame) = stack.last_mut() {
        if shutdown.load(Ordering::Relaxed) {
            debug!(discovered, "Traversal stopped by shutdown");
            return Err(StatsError::Interrupted);
        }

        match frame.children.next() {
            Some(entry) => {
                discovered += 1;
                stack.push(Frame::enter(entry.node, detector)?);
            }
            None => {
                let Some(Frame { node, .. }) = stack.pop() else {
                    break;
                };
                queue
                    .push(node)
                    .map_err(|_| StatsError::Worker(WorkerError::QueueSendFailed))?;
            }
        }
    }

    debug!(discovered, "Traversal finished");
    Ok(discovered)
}
