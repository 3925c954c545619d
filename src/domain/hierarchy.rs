//! Parent/child graph for nodes
//!
//! Used to guard reparenting against cycles. Edges point from parent to
//! child. Uses petgraph for reachability queries.

use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

use super::id::NodeId;

#[derive(Debug, Error, PartialEq)]
pub enum HierarchyError {
    #[error("Node {0} cannot be its own parent")]
    SelfParent(NodeId),

    #[error("Moving {child} under {parent} would create a cycle ({parent} is a descendant of {child})")]
    CycleDetected { child: NodeId, parent: NodeId },
}

/// The parent/child relation over a set of nodes
#[derive(Debug, Default)]
pub struct Hierarchy {
    graph: DiGraph<NodeId, ()>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from `(id, parent_id)` pairs
    ///
    /// Parents that are not themselves in the input (dangling references)
    /// are added as bare vertices.
    pub fn from_links(links: impl IntoIterator<Item = (NodeId, Option<NodeId>)>) -> Self {
        let mut hierarchy = Self::new();
        for (id, parent) in links {
            let child_idx = hierarchy.vertex(id);
            if let Some(parent) = parent {
                let parent_idx = hierarchy.vertex(parent);
                hierarchy.graph.add_edge(parent_idx, child_idx, ());
            }
        }
        hierarchy
    }

    fn vertex(&mut self, id: NodeId) -> NodeIndex {
        if let Some(idx) = self.node_map.get(&id) {
            return *idx;
        }
        let idx = self.graph.add_node(id);
        self.node_map.insert(id, idx);
        idx
    }

    /// Checks that `child` may be placed under `parent`
    ///
    /// Fails when `parent` is `child` itself or one of its descendants.
    pub fn check_reparent(&self, child: NodeId, parent: NodeId) -> Result<(), HierarchyError> {
        if child == parent {
            return Err(HierarchyError::SelfParent(child));
        }

        let (Some(child_idx), Some(parent_idx)) =
            (self.node_map.get(&child), self.node_map.get(&parent))
        else {
            return Ok(());
        };

        if has_path_connecting(&self.graph, *child_idx, *parent_idx, None) {
            return Err(HierarchyError::CycleDetected { child, parent });
        }

        Ok(())
    }

    /// Returns true if the stored relation already contains a cycle
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
