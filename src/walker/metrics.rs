//! Per-node metrics and the eight shared accumulators
//!
//! A node's metrics are computed in full before any accumulator is touched,
//! so a node whose store calls fail contributes nothing at all.

use crate::error::StoreResult;
use crate::stats::{Statistics, StatisticsSnapshot};
use crate::tree::TreeNode;

/// Statistic names, in report order
pub const PROPERTIES: &str = "properties";
pub const PROPERTY_NAMES_LENGTH: &str = "property.names.length";
pub const PROPERTY_VALUES_SIZE: &str = "property.values.size";
pub const CHILDREN: &str = "children";
pub const CHILD_NAMES_LENGTH: &str = "child.names.length";
pub const SINGLE_PROPERTY_NAMES_LENGTH: &str = "single.property.names.length";
pub const SINGLE_PROPERTY_VALUES_SIZE: &str = "single.property.values.size";
pub const SINGLE_CHILD_NAMES_LENGTH: &str = "single.child.names.length";

/// All statistic names in report order
pub const STATISTIC_NAMES: [&str; 8] = [
    PROPERTIES,
    PROPERTY_NAMES_LENGTH,
    PROPERTY_VALUES_SIZE,
    CHILDREN,
    CHILD_NAMES_LENGTH,
    SINGLE_PROPERTY_NAMES_LENGTH,
    SINGLE_PROPERTY_VALUES_SIZE,
    SINGLE_CHILD_NAMES_LENGTH,
];

/// Length of a name as counted by the statistics
pub fn name_length(name: &str) -> u64 {
    name.encode_utf16().count() as u64
}

/// Metrics of a single node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMetrics {
    pub properties: u64,
    pub property_names_length: u64,
    pub property_values_size: u64,
    pub children: u64,
    pub child_names_length: u64,

    /// Running name-length total seen before each property
    pub single_property_names_length: Vec<u64>,

    /// Size of every non-binary property value
    pub single_property_values_size: Vec<u64>,

    /// Name length of every child
    pub single_child_names_length: Vec<u64>,
}

impl NodeMetrics {
    /// Read a node's properties and children and compute its metrics
    pub fn compute<N: TreeNode>(node: &N) -> StoreResult<Self> {
        let properties = node.properties()?;
        let children = node.children()?;

        let mut metrics = NodeMetrics::default();

        for property in &properties {
            metrics.properties += 1;

            // Records the prefix total, not this property's own length
            metrics
                .single_property_names_length
                .push(metrics.property_names_length);
            metrics.property_names_length += name_length(&property.name);

            if property.is_size_exempt() {
                continue;
            }

            for index in 0..property.count() {
                let size = property.size(index);
                metrics.single_property_values_size.push(size);
                metrics.property_values_size += size;
            }
        }

        for entry in &children {
            metrics.children += 1;

            let length = name_length(&entry.name);
            metrics.single_child_names_length.push(length);
            metrics.child_names_length += length;
        }

        Ok(metrics)
    }
}

/// The eight accumulators shared by all workers
#[derive(Debug, Default)]
pub struct NodeStatistics {
    pub properties: Statistics,
    pub property_names_length: Statistics,
    pub property_values_size: Statistics,
    pub children: Statistics,
    pub child_names_length: Statistics,
    pub single_property_names_length: Statistics,
    pub single_property_values_size: Statistics,
    pub single_child_names_length: Statistics,
}

impl NodeStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one node's metrics into the accumulators
    pub fn record(&self, metrics: &NodeMetrics) {
        for &v in &metrics.single_property_names_length {
            self.single_property_names_length.add_value(v);
        }
        for &v in &metrics.single_property_values_size {
            self.single_property_values_size.add_value(v);
        }
        for &v in &metrics.single_child_names_length {
            self.single_child_names_length.add_value(v);
        }

        self.properties.add_value(metrics.properties);
        self.property_names_length
            .add_value(metrics.property_names_length);
        self.property_values_size
            .add_value(metrics.property_values_size);
        self.children.add_value(metrics.children);
        self.child_names_length.add_value(metrics.child_names_length);
    }

    /// Accumulators paired with their names, in report order
    pub fn named(&self) -> [(&'static str, &Statistics); 8] {
        [
            (PROPERTIES, &self.properties),
            (PROPERTY_NAMES_LENGTH, &self.property_names_length),
            (PROPERTY_VALUES_SIZE, &self.property_values_size),
            (CHILDREN, &self.children),
            (CHILD_NAMES_LENGTH, &self.child_names_length),
            (SINGLE_PROPERTY_NAMES_LENGTH, &self.single_property_names_length),
            (SINGLE_PROPERTY_VALUES_SIZE, &self.single_property_values_size),
            (SINGLE_CHILD_NAMES_LENGTH, &self.single_child_names_length),
        ]
    }

    /// Snapshot every accumulator, in report order
    pub fn snapshot(&self) -> Vec<(&'static str, StatisticsSnapshot)> {
        self.named()
            .into_iter()
            .map(|(name, stats)| (name, stats.snapshot()))
            .collect()
    }
}
