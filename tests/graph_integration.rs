//! Integration tests for building and drawing the idea graph.
//!
//! Ideas are written through `FilesystemIdeaStore`, resolved into a graph and
//! laid out with `RenderContext`.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{Duration, Utc};
use santra::graph::{RenderContext, SimulationConfig, resolve};
use santra::models::{Graph, Idea, IdeaId};
use santra::{FilesystemIdeaStore, IdeaStore};
use tempfile::TempDir;

fn idea(id: &str, title: &str, connections: &[&str], age_minutes: i64) -> Idea {
    Idea {
        id: IdeaId::new(id),
        title: title.to_string(),
        content: format!("About {title}."),
        tags: Vec::new(),
        connections: connections.iter().map(ToString::to_string).collect(),
        created: Utc::now() - Duration::minutes(age_minutes),
        modified: None,
        original: title.to_string(),
        source: "test".to_string(),
    }
}

fn store_with(ideas: &[Idea]) -> (TempDir, FilesystemIdeaStore) {
    let dir = TempDir::new().unwrap();
    let store = FilesystemIdeaStore::new(dir.path());
    for idea in ideas {
        store.save(idea).unwrap();
    }
    (dir, store)
}

fn linked(graph: &Graph, a: &str, b: &str) -> bool {
    let (Some(a), Some(b)) = (graph.index_of(a), graph.index_of(b)) else {
        return false;
    };
    graph
        .links
        .iter()
        .any(|l| (l.source, l.target) == (a, b) || (l.source, l.target) == (b, a))
}

#[test]
fn test_substring_reference_links_only_matching_idea() {
    let (_dir, store) = store_with(&[
        idea("apple", "Apple Orchard Plan", &[], 4),
        idea("banana", "Banana Market", &[], 3),
        idea("unrelated", "Unrelated", &[], 2),
        idea("source", "Fruit Co-op", &["apple orchard"], 1),
    ]);

    let graph = resolve(&store.list_all().unwrap());
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.links.len(), 1);
    assert!(linked(&graph, "source", "apple"));
    assert!(!linked(&graph, "source", "banana"));
    assert!(!linked(&graph, "source", "unrelated"));
}

#[test]
fn test_nodes_follow_listing_order() {
    let (_dir, store) = store_with(&[
        idea("old", "Old", &[], 10),
        idea("new", "New", &[], 1),
    ]);

    let graph = resolve(&store.list_all().unwrap());
    let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[test]
fn test_mutual_references_produce_one_link() {
    let (_dir, store) = store_with(&[
        idea("seeds", "Seed Library", &["Tool Library"], 2),
        idea("tools", "Tool Library", &["Seed Library"], 1),
    ]);

    let graph = resolve(&store.list_all().unwrap());
    assert_eq!(graph.links.len(), 1);
    assert!(linked(&graph, "seeds", "tools"));
}

#[test]
fn test_dangling_and_self_references_are_dropped() {
    let (_dir, store) = store_with(&[
        idea("compost", "Compost Hub", &["Compost Hub", "Nonexistent Thing"], 1),
    ]);

    let graph = resolve(&store.list_all().unwrap());
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.links.is_empty());
}

#[test]
fn test_settled_layout_over_stored_ideas() {
    let (_dir, store) = store_with(&[
        idea("a", "Community Orchard", &["Seed Library"], 5),
        idea("b", "Seed Library", &["Tool Library"], 4),
        idea("c", "Tool Library", &[], 3),
        idea("d", "Rooftop Beehives", &[], 2),
        idea("e", "Rainwater Barrels", &["Community Orchard"], 1),
    ]);

    let graph = resolve(&store.list_all().unwrap());
    let ctx = RenderContext::settled(graph, SimulationConfig::default());

    assert!(ctx.is_settled());
    let info = ctx.network_info();
    assert_eq!(info.nodes, 5);
    assert_eq!(info.links, 3);
    assert_eq!(info.to_string(), "5 nodes, 3 connections");

    let scene = ctx.scene();
    assert!(scene.settled);
    for node in &scene.nodes {
        assert!(node.x.is_finite() && node.y.is_finite());
    }
    for link in &scene.links {
        let source = &scene.nodes[link.source];
        assert!((link.x1 - source.x).abs() < f64::EPSILON);
        assert!((link.y1 - source.y).abs() < f64::EPSILON);
    }
}

#[test]
fn test_svg_marks_highlighted_node() {
    let (_dir, store) = store_with(&[
        idea("orchard", "Community Orchard Expansion", &[], 2),
        idea("seeds", "Seed Library", &["Community Orchard"], 1),
    ]);

    let graph = resolve(&store.list_all().unwrap());
    let mut ctx = RenderContext::settled(graph, SimulationConfig::default());
    assert!(ctx.highlight("orchard"));

    let svg = ctx.to_svg();
    assert!(svg.starts_with("<svg"));
    assert_eq!(svg.matches(r#"class="node highlighted""#).count(), 1);
    assert!(svg.contains(r#"class="node highlighted" data-id="orchard""#));
    assert!(svg.contains(">Community Or...</text>"));
    assert!(svg.contains("<title>Community Orchard Expansion</title>"));
    assert_eq!(svg.matches(r#"<line class="link""#).count(), 1);

    assert!(!ctx.highlight("missing"));
    assert!(!ctx.to_svg().contains("node highlighted\""));
}

#[test]
fn test_rerender_after_new_idea() {
    let (_dir, store) = store_with(&[idea("a", "Alpha", &[], 2)]);

    let mut ctx = RenderContext::settled(
        resolve(&store.list_all().unwrap()),
        SimulationConfig::default(),
    );
    ctx.zoom_in();
    assert!(ctx.highlight("a"));

    store.save(&idea("b", "Beta", &["Alpha"], 1)).unwrap();
    ctx.render(resolve(&store.list_all().unwrap()));

    assert_eq!(ctx.network_info().nodes, 2);
    assert_eq!(ctx.network_info().links, 1);
    assert!(ctx.highlighted().is_none());
    assert!(ctx.transform().k > 1.0);
    assert!(!ctx.is_settled());
}

#[test]
fn test_drag_pins_then_releases() {
    let (_dir, store) = store_with(&[
        idea("a", "Alpha", &["Beta"], 2),
        idea("b", "Beta", &[], 1),
    ]);

    let mut ctx = RenderContext::settled(
        resolve(&store.list_all().unwrap()),
        SimulationConfig::default(),
    );
    let scene = ctx.scene();
    let target = &scene.nodes[0];
    let idx = ctx.node_at(target.x, target.y).unwrap();
    assert_eq!(idx, 0);

    assert!(ctx.drag_start(idx));
    ctx.drag_to(100.0, 120.0);
    for _ in 0..20 {
        ctx.tick();
    }
    let pos = ctx.simulation().unwrap().position(idx).unwrap();
    assert_eq!(pos, (100.0, 120.0));
    assert!(!ctx.is_settled());

    ctx.drag_end();
    ctx.run_until_settled(1_000);
    assert!(ctx.is_settled());
    let body = ctx.simulation().unwrap().bodies()[idx];
    assert!(body.fx.is_none() && body.fy.is_none());
}

#[test]
fn test_empty_store_renders_empty_frame() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemIdeaStore::new(dir.path().join("missing"));

    let ctx = RenderContext::settled(
        resolve(&store.list_all().unwrap()),
        SimulationConfig::default(),
    );
    assert!(ctx.is_settled());
    assert_eq!(ctx.network_info().to_string(), "0 nodes, 0 connections");
    assert!(!ctx.to_svg().contains("<g class=\"node"));
}
