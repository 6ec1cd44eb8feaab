//! Connection resolution.
//!
//! Connections are free text, not identifiers. Each reference is matched
//! against node titles by an ordered list of pure matchers; the first
//! matcher that finds any node wins. References that match nothing name
//! ideas that have not been captured yet and are dropped.

use super::layout::{GRID_SPACING, grid_positions};
use crate::models::{Graph, GraphLink, GraphNode, IdeaSummary, NodeIdx};
use std::collections::HashSet;

/// A title matcher: `(reference, title) -> matched`.
pub type Matcher = fn(&str, &str) -> bool;

/// Matchers in the order they are tried.
pub const MATCHERS: [(&str, Matcher); 3] = [
    ("exact", exact_title),
    ("substring", substring),
    ("keywords", keyword_overlap),
];

/// Minimum characters for a word to count as a keyword (exclusive).
const KEYWORD_MIN_CHARS: usize = 3;

/// Keywords that must overlap for a keyword match.
const KEYWORD_MIN_OVERLAP: usize = 2;

/// Exact, case-sensitive title match.
#[must_use]
pub fn exact_title(reference: &str, title: &str) -> bool {
    reference == title
}

/// Case-insensitive containment in either direction.
#[must_use]
pub fn substring(reference: &str, title: &str) -> bool {
    if reference.trim().is_empty() || title.trim().is_empty() {
        return false;
    }
    let reference = reference.to_lowercase();
    let title = title.to_lowercase();
    title.contains(&reference) || reference.contains(&title)
}

/// At least two keywords of the reference overlap a keyword of the title.
///
/// Keywords are lowercase whitespace-separated words longer than three
/// characters; two keywords overlap when either contains the other.
#[must_use]
pub fn keyword_overlap(reference: &str, title: &str) -> bool {
    let title_words = keywords(title);
    if title_words.is_empty() {
        return false;
    }
    keywords(reference)
        .iter()
        .filter(|word| {
            title_words
                .iter()
                .any(|t| t.contains(word.as_str()) || word.contains(t.as_str()))
        })
        .count()
        >= KEYWORD_MIN_OVERLAP
}

fn keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > KEYWORD_MIN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Finds the node a reference points at.
///
/// Returns the node index and the name of the matcher that found it.
#[must_use]
pub fn find_target(nodes: &[GraphNode], reference: &str) -> Option<(NodeIdx, &'static str)> {
    MATCHERS.iter().find_map(|(name, matcher)| {
        nodes
            .iter()
            .position(|node| matcher(reference, &node.title))
            .map(|idx| (idx, *name))
    })
}

/// Builds nodes and deduplicated links from idea summaries.
///
/// Nodes keep summary order and get grid seed positions. A link is dropped
/// when its reference matches nothing, when it resolves back to its own
/// idea, or when the same pair of ideas is already linked in either
/// direction.
#[must_use]
pub fn resolve(summaries: &[IdeaSummary]) -> Graph {
    let positions = grid_positions(summaries.len(), GRID_SPACING);
    let nodes: Vec<GraphNode> = summaries
        .iter()
        .zip(positions)
        .map(|(summary, (x, y))| GraphNode {
            id: summary.id.clone(),
            title: summary.title.clone(),
            connections: summary.connections.clone(),
            x,
            y,
        })
        .collect();

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut links = Vec::new();

    for (source, node) in nodes.iter().enumerate() {
        for reference in &node.connections {
            let Some((target, matcher)) = find_target(&nodes, reference) else {
                tracing::debug!(from = %node.id, reference = %reference, "Unresolved connection");
                continue;
            };

            let target_id = nodes[target].id.as_str();
            let source_id = node.id.as_str();
            if target_id == source_id {
                continue;
            }

            let pair = if source_id <= target_id {
                (source_id, target_id)
            } else {
                (target_id, source_id)
            };
            if seen.insert(pair) {
                tracing::trace!(from = source_id, to = target_id, matcher, "Resolved connection");
                links.push(GraphLink { source, target });
            }
        }
    }

    Graph { nodes, links }
}
