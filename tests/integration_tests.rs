//! Integration tests for node-stats
//!
//! These run the full pipeline (traversal thread, bounded queue, worker pool,
//! completion detection, report) against in-memory and on-disk trees.

use node_stats::error::{StatsError, StoreError, StoreResult};
use node_stats::report::render_report;
use node_stats::tree::{self, ChildEntry, FsTree, MemoryNode, PropertyInfo, PropertyType, TreeNode};
use node_stats::walker::{NodeMetrics, StatsCoordinator, STATISTIC_NAMES};
use node_stats::RunConfig;
use std::fs;
use tempfile::tempdir;

fn config(workers: usize, queue_size: usize) -> RunConfig {
    RunConfig {
        worker_count: workers,
        queue_size,
        ..RunConfig::default()
    }
}

/// Root with children "a" (empty) and "bb" (one 5-byte string property "x")
fn scenario_tree() -> MemoryNode {
    MemoryNode::builder()
        .child("a", MemoryNode::leaf())
        .child("bb", MemoryNode::builder().string("x", "hello").build())
        .build()
}

/// Deterministic tree with `fanout^depth` leaves and mixed properties
fn generated_tree(depth: u32, fanout: usize) -> MemoryNode {
    let mut builder = MemoryNode::builder()
        .string("jcr:primaryType", "nt:unstructured")
        .property(PropertyInfo::array(
            "tags",
            PropertyType::String,
            vec![depth as u64 * 37, 250],
        ))
        .binary("jcr:data", 10_000);

    if depth > 0 {
        for i in 0..fanout {
            builder = builder.child(format!("node-{depth}-{i}"), generated_tree(depth - 1, fanout));
        }
    }
    builder.build()
}

#[test]
fn test_end_to_end_scenario() {
    let report = StatsCoordinator::new(config(3, 16))
        .run(scenario_tree())
        .unwrap();

    let children = report.get("children").unwrap();
    assert_eq!(children.n, 3);
    assert_eq!(children.sum, 2);
    assert_eq!(children.max, 2);

    let child_names = report.get("child.names.length").unwrap();
    assert_eq!(child_names.sum, 3);
    assert_eq!(child_names.max, 3);

    let single_child_names = report.get("single.child.names.length").unwrap();
    assert_eq!(single_child_names.n, 2);
    assert_eq!(single_child_names.sum, 3);
    assert_eq!(single_child_names.max, 2);

    let properties = report.get("properties").unwrap();
    assert_eq!(properties.n, 3);
    assert_eq!(properties.sum, 1);

    let values = report.get("property.values.size").unwrap();
    assert_eq!(values.n, 3);
    assert_eq!(values.sum, 5);
    assert_eq!(values.max, 5);

    let single_names = report.get("single.property.names.length").unwrap();
    assert_eq!(single_names.n, 1);
    assert_eq!(single_names.sum, 0);

    assert_eq!(report.summary.nodes_discovered, 3);
    assert_eq!(report.summary.nodes_processed, 3);
    assert_eq!(report.summary.failed_nodes, 0);
}

#[test]
fn test_scenario_report_text() {
    let report = node_stats::run(scenario_tree()).unwrap();
    let text = render_report(&report.statistics);

    let expected_head = "properties.n 3\n\
                         properties.max 1\n\
                         properties.sum 1\n\
                         properties.mean 0.3333333333333333\n\
                         properties.histogram 0 100 3\n";
    assert!(text.starts_with(expected_head), "unexpected report:\n{text}");
    assert!(text.contains("single.property.values.size.n 1\n"));
    assert!(text.contains("single.child.names.length.histogram 0 100 2\n"));

    // Four summary lines plus one bucket per statistic, all buckets below 100
    assert_eq!(text.lines().count(), STATISTIC_NAMES.len() * 5);
}

#[test]
fn test_properties_n_equals_tree_size() {
    let tree = generated_tree(4, 3);
    let size = tree.subtree_size();

    let report = StatsCoordinator::new(config(4, 8)).run(tree).unwrap();

    for name in ["properties", "property.names.length", "property.values.size", "children", "child.names.length"] {
        assert_eq!(report.get(name).unwrap().n, size, "{name}");
    }
    assert_eq!(report.summary.nodes_discovered, size);
}

#[test]
fn test_histogram_totals_match_counts() {
    let report = StatsCoordinator::new(config(8, 4))
        .run(generated_tree(5, 3))
        .unwrap();

    for (name, snapshot) in &report.statistics {
        assert_eq!(snapshot.bucket_total(), snapshot.n, "{name}");
        assert!(
            snapshot.buckets.windows(2).all(|w| w[0].lower < w[1].lower),
            "{name} buckets out of order"
        );
    }
}

#[test]
fn test_matches_sequential_computation() {
    let tree = generated_tree(4, 4);

    // Reference: compute every node's metrics on this thread
    let mut expected_values_size = 0;
    let mut expected_single_values = 0;
    let mut stack = vec![tree.clone()];
    while let Some(node) = stack.pop() {
        let metrics = NodeMetrics::compute(&node).unwrap();
        expected_values_size += metrics.property_values_size;
        expected_single_values += metrics.single_property_values_size.len() as u64;
        stack.extend(node.children().unwrap().into_iter().map(|c| c.node));
    }

    let report = StatsCoordinator::new(config(6, 2)).run(tree).unwrap();
    assert_eq!(report.get("property.values.size").unwrap().sum, expected_values_size);
    assert_eq!(report.get("single.property.values.size").unwrap().n, expected_single_values);
}

#[test]
fn test_binary_properties_excluded_from_sizes() {
    let tree = MemoryNode::builder()
        .binary("jcr:data", 1_000_000)
        .property(PropertyInfo::array("blobs", PropertyType::Binary, vec![5, 6]))
        .build();

    let report = node_stats::run(tree).unwrap();

    assert_eq!(report.get("properties").unwrap().sum, 2);
    assert_eq!(report.get("property.names.length").unwrap().sum, 13);
    assert_eq!(report.get("single.property.names.length").unwrap().n, 2);
    assert_eq!(report.get("property.values.size").unwrap().sum, 0);
    assert_eq!(report.get("single.property.values.size").unwrap().n, 0);
}

#[test]
fn test_value_of_100_lands_in_second_bucket() {
    let tree = MemoryNode::builder()
        .property(PropertyInfo::single("p", PropertyType::String, 100))
        .property(PropertyInfo::single("q", PropertyType::String, 99))
        .build();

    let report = node_stats::run(tree).unwrap();
    let buckets = &report.get("single.property.values.size").unwrap().buckets;

    assert_eq!(buckets.len(), 2);
    assert_eq!((buckets[0].lower, buckets[0].upper, buckets[0].count), (0, 100, 1));
    assert_eq!((buckets[1].lower, buckets[1].upper, buckets[1].count), (100, 200, 1));
}

#[test]
fn test_repeated_runs_are_identical() {
    let tree = generated_tree(4, 3);

    let first = render_report(&StatsCoordinator::new(config(2, 4)).run(tree.clone()).unwrap().statistics);
    let second = render_report(&StatsCoordinator::new(config(7, 1024)).run(tree).unwrap().statistics);

    assert_eq!(first, second);
}

/// Which store call fails, and on which node
#[derive(Clone, Copy)]
enum Fault {
    Children(&'static str),
    Properties(&'static str),
}

/// Wraps an in-memory node and fails one store call on one path
#[derive(Clone)]
struct FaultyNode {
    inner: MemoryNode,
    path: String,
    fault: Fault,
}

impl FaultyNode {
    fn root(inner: MemoryNode, fault: Fault) -> Self {
        Self {
            inner,
            path: "/".to_string(),
            fault,
        }
    }
}

impl TreeNode for FaultyNode {
    fn children(&self) -> StoreResult<Vec<ChildEntry<Self>>> {
        if let Fault::Children(path) = self.fault {
            if self.path == path {
                return Err(StoreError::ListChildren {
                    path: self.path.clone(),
                    reason: "record not found".into(),
                });
            }
        }

        Ok(self
            .inner
            .children()?
            .into_iter()
            .map(|entry| {
                let path = format!("{}{}/", self.path, entry.name);
                ChildEntry::new(
                    entry.name,
                    FaultyNode {
                        inner: entry.node,
                        path,
                        fault: self.fault,
                    },
                )
            })
            .collect())
    }

    fn properties(&self) -> StoreResult<Vec<PropertyInfo>> {
        if let Fault::Properties(path) = self.fault {
            if self.path == path {
                return Err(StoreError::ListProperties {
                    path: self.path.clone(),
                    reason: "record not found".into(),
                });
            }
        }
        self.inner.properties()
    }
}

#[test]
fn test_traversal_failure_aborts_run() {
    let tree = FaultyNode::root(generated_tree(3, 3), Fault::Children("/node-3-1/node-2-0/"));

    let err = StatsCoordinator::new(config(2, 4)).run(tree).unwrap_err();
    assert!(
        matches!(err, StatsError::Traversal { source: StoreError::ListChildren { ref path, .. } } if path == "/node-3-1/node-2-0/"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_root_listing_failure() {
    let tree = FaultyNode::root(scenario_tree(), Fault::Children("/"));

    let err = StatsCoordinator::new(config(1, 4)).run(tree).unwrap_err();
    assert!(matches!(err, StatsError::Traversal { .. }));
}

#[test]
fn test_processing_failure_drops_only_that_node() {
    let tree = FaultyNode::root(scenario_tree(), Fault::Properties("/bb/"));

    let report = StatsCoordinator::new(config(2, 4)).run(tree).unwrap();

    assert_eq!(report.summary.nodes_discovered, 3);
    assert_eq!(report.summary.nodes_processed, 2);
    assert_eq!(report.summary.failed_nodes, 1);

    // The failed node contributes nothing, not even its child-name metrics
    assert_eq!(report.get("properties").unwrap().n, 2);
    assert_eq!(report.get("property.values.size").unwrap().sum, 0);
    assert_eq!(report.get("children").unwrap().n, 2);
}

#[test]
fn test_processing_failure_is_fatal_when_strict() {
    let tree = FaultyNode::root(scenario_tree(), Fault::Properties("/a/"));
    let strict = RunConfig {
        strict: true,
        ..config(2, 4)
    };

    let err = StatsCoordinator::new(strict).run(tree).unwrap_err();
    assert!(matches!(err, StatsError::ProcessingFailed { failed: 1 }));
}

#[test]
fn test_filesystem_store_scenario() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    fs::create_dir(dir.path().join("bb")).unwrap();
    fs::write(dir.path().join("bb").join("x"), "hello").unwrap();

    let store = FsTree::open(dir.path()).unwrap();
    let report = StatsCoordinator::new(config(2, 16))
        .run(store.root())
        .unwrap();

    let direct = StatsCoordinator::new(config(2, 16))
        .run(scenario_tree())
        .unwrap();

    assert_eq!(render_report(&report.statistics), render_report(&direct.statistics));
}

#[test]
fn test_filesystem_store_binary_and_arrays() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("blob"), [0xffu8, 0x00, 0xfe, 0x10]).unwrap();
    fs::write(dir.path().join("tags"), "one\nthree\n").unwrap();

    let store = FsTree::open(dir.path()).unwrap();
    let report = node_stats::run(store.root()).unwrap();

    // "blob" contributes a name but no sizes; "tags" contributes two values
    assert_eq!(report.get("properties").unwrap().sum, 2);
    assert_eq!(report.get("property.names.length").unwrap().sum, 8);
    assert_eq!(report.get("property.values.size").unwrap().sum, 8);
    assert_eq!(report.get("single.property.values.size").unwrap().n, 2);
}

#[test]
fn test_start_path_selects_subtree() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("content").join("dam").join("asset")).unwrap();
    fs::create_dir(dir.path().join("system")).unwrap();

    let store = FsTree::open(dir.path()).unwrap();
    let start = tree::resolve(store.root(), "/content/dam").unwrap();
    let report = node_stats::run(start).unwrap();

    assert_eq!(report.summary.nodes_discovered, 2);

    let err = tree::resolve(store.root(), "/content/missing").unwrap_err();
    assert_eq!(err.to_string(), "Node at path /content/missing does not exist");
}

#[test]
fn test_start_path_cannot_leave_store() {
    let dir = tempdir().unwrap();
    let store_dir = dir.path().join("store");
    fs::create_dir(&store_dir).unwrap();
    fs::create_dir(dir.path().join("secret")).unwrap();

    let store = FsTree::open(&store_dir).unwrap();
    for path in ["/../secret", "/./..", "/.."] {
        let err = tree::resolve(store.root(), path).unwrap_err();
        assert!(matches!(err, StatsError::NodeNotFound { .. }), "{path} resolved");
    }
}

#[test]
fn test_very_deep_chain() {
    let mut node = MemoryNode::leaf();
    for _ in 0..100_000 {
        node = MemoryNode::builder().child("n", node).build();
    }

    let report = StatsCoordinator::new(config(2, 1024)).run(node).unwrap();

    assert_eq!(report.summary.nodes_discovered, 100_001);
    assert_eq!(report.summary.nodes_processed, 100_001);
    assert_eq!(report.get("children").unwrap().sum, 100_000);
    assert_eq!(report.get("single.child.names.length").unwrap().n, 100_000);
}
