//! Data models for santra.
//!
//! Idea records as persisted on disk, the summaries used for listing, and the
//! ephemeral graph types rebuilt on every render.

mod graph;
mod idea;

pub use graph::{Graph, GraphLink, GraphNode, NodeIdx};
pub use idea::{Idea, IdeaId, IdeaSummary};
