//! In-memory tree
//!
//! Nodes are reference counted so handing a child to the work queue is a
//! cheap clone. Used by library callers that already hold their tree in
//! memory, and by the tests and benchmarks.

use super::{ChildEntry, PropertyInfo, PropertyType, TreeNode};
use crate::error::StoreResult;
use std::sync::Arc;

#[derive(Debug, Default)]
struct NodeData {
    properties: Vec<PropertyInfo>,
    children: Vec<ChildEntry<MemoryNode>>,
}

// Unlinks children iteratively so dropping a very deep tree never recurses
// through nested `Arc<NodeData>` drops.
impl Drop for NodeData {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(entry) = pending.pop() {
            if let Some(mut data) = Arc::into_inner(entry.node.data) {
                pending.append(&mut data.children);
            }
        }
    }
}

/// Handle to an in-memory node
#[derive(Debug, Clone, Default)]
pub struct MemoryNode {
    data: Arc<NodeData>,
}

impl MemoryNode {
    /// Start building a node
    pub fn builder() -> MemoryNodeBuilder {
        MemoryNodeBuilder::default()
    }

    /// A node with no properties and no children
    pub fn leaf() -> Self {
        Self::default()
    }

    /// Number of nodes in the subtree rooted here
    pub fn subtree_size(&self) -> u64 {
        let mut count = 0;
        let mut stack = vec![self.clone()];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.data.children.iter().map(|c| c.node.clone()));
        }
        count
    }
}

impl TreeNode for MemoryNode {
    fn children(&self) -> StoreResult<Vec<ChildEntry<Self>>> {
        Ok(self.data.children.clone())
    }

    fn properties(&self) -> StoreResult<Vec<PropertyInfo>> {
        Ok(self.data.properties.clone())
    }

    fn child(&self, name: &str) -> StoreResult<Option<Self>> {
        Ok(self
            .data
            .children
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.node.clone()))
    }
}

/// Builder for [`MemoryNode`]
#[derive(Debug, Default)]
pub struct MemoryNodeBuilder {
    data: NodeData,
}

impl MemoryNodeBuilder {
    /// Add an arbitrary property
    pub fn property(mut self, property: PropertyInfo) -> Self {
        self.data.properties.push(property);
        self
    }

    /// Add a single-valued string property; its size is the UTF-8 length
    pub fn string(self, name: impl Into<String>, value: &str) -> Self {
        self.property(PropertyInfo::single(
            name,
            PropertyType::String,
            value.len() as u64,
        ))
    }

    /// Add a single-valued binary property of `size` bytes
    pub fn binary(self, name: impl Into<String>, size: u64) -> Self {
        self.property(PropertyInfo::single(name, PropertyType::Binary, size))
    }

    /// Add a child node
    pub fn child(mut self, name: impl Into<String>, node: MemoryNode) -> Self {
        self.data.children.push(ChildEntry::new(name, node));
        self
    }

    pub fn build(self) -> MemoryNode {
        MemoryNode {
            data: Arc::new(self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_order() {
        let node = MemoryNode::builder()
            .string("b", "1")
            .string("a", "22")
            .child("z", MemoryNode::leaf())
            .child("y", MemoryNode::leaf())
            .build();

        let props = node.properties().unwrap();
        assert_eq!(props[0].name, "b");
        assert_eq!(props[1].value_sizes, vec![2]);

        let names: Vec<_> = node.children().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["z", "y"]);
    }

    #[test]
    fn test_subtree_size() {
        let node = MemoryNode::builder()
            .child("a", MemoryNode::builder().child("b", MemoryNode::leaf()).build())
            .child("c", MemoryNode::leaf())
            .build();

        assert_eq!(node.subtree_size(), 4);
        assert_eq!(MemoryNode::leaf().subtree_size(), 1);
    }

    fn chain(depth: usize) -> MemoryNode {
        let mut node = MemoryNode::leaf();
        for _ in 0..depth {
            node = MemoryNode::builder().child("n", node).build();
        }
        node
    }

    #[test]
    fn test_deep_chain_drops_without_recursion() {
        let root = chain(200_000);
        assert_eq!(root.subtree_size(), 200_001);
        drop(root);
    }

    #[test]
    fn test_drop_keeps_shared_subtrees() {
        let shared = chain(10);
        let root = MemoryNode::builder().child("s", shared.clone()).build();
        drop(root);

        assert_eq!(shared.subtree_size(), 11);
        assert_eq!(shared.children().unwrap().len(), 1);
    }
}
