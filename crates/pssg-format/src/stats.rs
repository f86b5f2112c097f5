//! Summary statistics over a node tree.

use std::collections::BTreeMap;

use crate::Node;

/// Counts gathered in a single walk of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TreeStats {
    /// Total number of nodes, root included.
    pub node_count: usize,
    /// Nodes without children.
    pub leaf_count: usize,
    /// Nodes carrying a data blob.
    pub data_node_count: usize,
    /// Sum of data blob lengths.
    pub data_bytes: u64,
    /// Total number of attributes.
    pub attribute_count: usize,
    /// Sum of attribute value lengths.
    pub attribute_bytes: u64,
    /// Deepest nesting level; the root is level 1.
    pub max_depth: usize,
    /// Occurrences per node name.
    pub by_name: BTreeMap<String, usize>,
}

impl TreeStats {
    /// Walk `root` and collect statistics.
    pub fn collect(root: &Node) -> Self {
        let mut stats = TreeStats::default();
        let mut stack = vec![(root, 1usize)];

        while let Some((node, depth)) = stack.pop() {
            stats.node_count += 1;
            stats.max_depth = stats.max_depth.max(depth);
            *stats.by_name.entry(node.name.clone()).or_default() += 1;

            stats.attribute_count += node.attributes.len();
            stats.attribute_bytes += node
                .attributes
                .iter()
                .map(|a| a.value.len() as u64)
                .sum::<u64>();

            if node.is_leaf() {
                stats.leaf_count += 1;
                if let Some(data) = &node.data {
                    stats.data_node_count += 1;
                    stats.data_bytes += data.len() as u64;
                }
            }

            stack.extend(node.children.iter().map(|c| (c, depth + 1)));
        }

        stats
    }

    /// Occurrences of `name`, ignoring ASCII case.
    pub fn count_named(&self, name: &str) -> usize {
        self.by_name
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, count)| count)
            .sum()
    }
}
