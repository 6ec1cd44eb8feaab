//! Ephemeral graph types.
//!
//! Nodes are addressed by their index in [`Graph::nodes`], never by object
//! identity, so the simulation and the drawing layer can hold independent
//! state keyed by the same [`NodeIdx`].

use super::IdeaId;
use serde::Serialize;

/// Index of a node within a [`Graph`].
pub type NodeIdx = usize;

/// A node derived from an idea summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    /// Idea identifier.
    pub id: IdeaId,
    /// Idea title.
    pub title: String,
    /// Raw connection references.
    pub connections: Vec<String>,
    /// Seed position (x).
    pub x: f64,
    /// Seed position (y).
    pub y: f64,
}

/// A resolved link between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GraphLink {
    /// Source node index.
    pub source: NodeIdx,
    /// Target node index.
    pub target: NodeIdx,
}

impl GraphLink {
    /// Returns the link endpoints as an unordered pair.
    #[must_use]
    pub const fn unordered(self) -> (NodeIdx, NodeIdx) {
        if self.source <= self.target {
            (self.source, self.target)
        } else {
            (self.target, self.source)
        }
    }
}

/// Resolved nodes and links.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    /// Nodes in idea order.
    pub nodes: Vec<GraphNode>,
    /// Deduplicated links.
    pub links: Vec<GraphLink>,
}

impl Graph {
    /// Returns the index of the node with the given idea id.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<NodeIdx> {
        self.nodes.iter().position(|n| n.id.as_str() == id)
    }

    /// Returns true if there are no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
