//! Tree store interface
//!
//! The statistics engine never owns the tree. It reads it through
//! [`TreeNode`]: ordered child entries and ordered property metadata. Stores
//! materialize nodes lazily, so only the nodes currently on the traversal
//! stack, in the queue, or in a worker are alive at any time.

pub mod fs;
pub mod memory;

pub use fs::{FsNode, FsTree};
pub use memory::{MemoryNode, MemoryNodeBuilder};

use crate::error::{Result, StatsError, StoreResult};

/// Value type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    String,
    Binary,
    Long,
    Double,
    Decimal,
    Boolean,
    Date,
    Name,
    Path,
    Reference,
    WeakReference,
    Uri,
}

impl PropertyType {
    /// Binary values are stored out of line and are excluded from size
    /// accounting
    pub fn is_size_exempt(self) -> bool {
        self == PropertyType::Binary
    }
}

/// Metadata of one property of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Property name
    pub name: String,

    /// Type of the values
    pub kind: PropertyType,

    /// Byte size of each value, in order
    pub value_sizes: Vec<u64>,
}

impl PropertyInfo {
    /// Single-valued property
    pub fn single(name: impl Into<String>, kind: PropertyType, size: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            value_sizes: vec![size],
        }
    }

    /// Multi-valued property
    pub fn array(name: impl Into<String>, kind: PropertyType, sizes: Vec<u64>) -> Self {
        Self {
            name: name.into(),
            kind,
            value_sizes: sizes,
        }
    }

    /// Number of values
    pub fn count(&self) -> usize {
        self.value_sizes.len()
    }

    /// Size in bytes of value `index`
    pub fn size(&self, index: usize) -> u64 {
        self.value_sizes[index]
    }

    /// True for binary and multi-valued binary properties
    pub fn is_size_exempt(&self) -> bool {
        self.kind.is_size_exempt()
    }
}

/// A named child of a node
#[derive(Debug, Clone)]
pub struct ChildEntry<N> {
    pub name: String,
    pub node: N,
}

impl<N> ChildEntry<N> {
    pub fn new(name: impl Into<String>, node: N) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }
}

/// Read-only handle to a node of an external tree
///
/// Handles are moved between the traversal thread and the worker threads,
/// hence `Send + 'static`.
pub trait TreeNode: Send + Sized + 'static {
    /// Ordered child entries of this node
    fn children(&self) -> StoreResult<Vec<ChildEntry<Self>>>;

    /// Ordered property metadata of this node
    fn properties(&self) -> StoreResult<Vec<PropertyInfo>>;

    /// Look up a single child by name
    fn child(&self, name: &str) -> StoreResult<Option<Self>> {
        Ok(self
            .children()?
            .into_iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.node))
    }
}

/// Split a node path into its non-empty elements
///
/// `/a//b/` yields `["a", "b"]`; `/` yields nothing.
pub fn path_elements(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|element| !element.is_empty())
}

/// Descend from `root` to the node at `path`
pub fn resolve<N: TreeNode>(root: N, path: &str) -> Result<N> {
    let mut node = root;
    for element in path_elements(path) {
        node = node
            .child(element)?
            .ok_or_else(|| StatsError::NodeNotFound {
                path: path.to_string(),
            })?;
    }
    Ok(node)
}
