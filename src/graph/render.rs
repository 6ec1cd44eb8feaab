//! Drawable graph state.
//!
//! A [`RenderContext`] owns everything about one displayed graph: the
//! resolved nodes and links, the running [`Simulation`], the highlighted
//! node, an in-progress drag and the view transform. There is no global
//! state; callers create as many contexts as they need.

use super::simulation::{Simulation, SimulationConfig};
use crate::models::{Graph, IdeaId, NodeIdx};
use serde::Serialize;
use std::fmt;

/// Maximum characters of a node label, including the ellipsis.
pub const LABEL_MAX_CHARS: usize = 15;

/// Zoom multiplier per step.
const ZOOM_STEP: f64 = 1.2;

/// Allowed zoom range.
const ZOOM_MIN: f64 = 0.1;
const ZOOM_MAX: f64 = 10.0;

/// Temperature held while a node is dragged.
const DRAG_ALPHA_TARGET: f64 = 0.3;

/// Upper bound on ticks for [`RenderContext::run_until_settled`].
pub const MAX_SETTLE_TICKS: usize = 1_000;

/// Pan and zoom applied to graph coordinates.
///
/// A graph point `p` is drawn at `p * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
    /// Scale.
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            k: 1.0,
        }
    }
}

impl ViewTransform {
    /// Maps a screen point to graph coordinates.
    #[must_use]
    pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
        ((sx - self.x) / self.k, (sy - self.y) / self.k)
    }

    /// Rescales by `factor` keeping the screen point `(cx, cy)` fixed.
    fn zoom_about(&mut self, factor: f64, cx: f64, cy: f64) {
        let k = (self.k * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        let (gx, gy) = self.screen_to_graph(cx, cy);
        self.x = cx - gx * k;
        self.y = cy - gy * k;
        self.k = k;
    }
}

/// Node and link counts for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    /// Number of nodes.
    pub nodes: usize,
    /// Number of links.
    pub links: usize,
}

impl NetworkInfo {
    /// "1 node", "3 nodes".
    #[must_use]
    pub fn node_label(&self) -> String {
        plural(self.nodes, "node")
    }

    /// "1 connection", "0 connections".
    #[must_use]
    pub fn link_label(&self) -> String {
        plural(self.links, "connection")
    }
}

impl fmt::Display for NetworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.node_label(), self.link_label())
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// One drawable node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    /// Idea identifier.
    pub id: IdeaId,
    /// Full title.
    pub title: String,
    /// Truncated label.
    pub label: String,
    /// Position (x).
    pub x: f64,
    /// Position (y).
    pub y: f64,
    /// Whether this node is highlighted.
    pub highlighted: bool,
}

/// One drawable link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneLink {
    /// Source node index.
    pub source: NodeIdx,
    /// Target node index.
    pub target: NodeIdx,
    /// Start point (x).
    pub x1: f64,
    /// Start point (y).
    pub y1: f64,
    /// End point (x).
    pub x2: f64,
    /// End point (y).
    pub y2: f64,
}

/// A drawable frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    /// Canvas width.
    pub width: f64,
    /// Canvas height.
    pub height: f64,
    /// Node radius.
    pub node_radius: f64,
    /// View transform.
    pub transform: ViewTransform,
    /// Nodes in graph order.
    pub nodes: Vec<SceneNode>,
    /// Links.
    pub links: Vec<SceneLink>,
    /// Counts.
    pub info: NetworkInfo,
    /// Whether the layout has settled.
    pub settled: bool,
}

/// State of one displayed graph.
#[derive(Debug, Clone)]
pub struct RenderContext {
    config: SimulationConfig,
    graph: Graph,
    simulation: Option<Simulation>,
    highlighted: Option<NodeIdx>,
    dragging: Option<NodeIdx>,
    transform: ViewTransform,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl RenderContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            graph: Graph::default(),
            simulation: None,
            highlighted: None,
            dragging: None,
            transform: ViewTransform::default(),
        }
    }

    /// Creates a context showing `graph` with the layout run to rest.
    #[must_use]
    pub fn settled(graph: Graph, config: SimulationConfig) -> Self {
        let mut ctx = Self::new(config);
        ctx.render(graph);
        let ticks = ctx.run_until_settled(MAX_SETTLE_TICKS);
        tracing::debug!(ticks, "Layout settled");
        ctx
    }

    /// Displays a new graph.
    ///
    /// Discards the previous nodes, links, simulation, highlight and drag,
    /// then seeds a fresh simulation from the graph's grid positions. An
    /// empty graph clears the context. The view transform is kept.
    pub fn render(&mut self, graph: Graph) {
        if graph.is_empty() {
            self.clear();
            return;
        }
        tracing::debug!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "Rendering graph"
        );
        self.simulation = Some(Simulation::new(&graph, self.config));
        self.graph = graph;
        self.highlighted = None;
        self.dragging = None;
    }

    /// Empties the context.
    pub fn clear(&mut self) {
        self.graph = Graph::default();
        self.simulation = None;
        self.highlighted = None;
        self.dragging = None;
    }

    /// The displayed graph.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The running simulation, if a graph is displayed.
    #[must_use]
    pub const fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    /// Advances the layout by one step.
    pub fn tick(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.tick();
        }
    }

    /// Ticks until the layout settles, up to `max_ticks`.
    ///
    /// Returns the number of ticks run.
    pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
        self.simulation
            .as_mut()
            .map_or(0, |simulation| simulation.run_until_settled(max_ticks))
    }

    /// Returns true when there is nothing left to animate.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.simulation.as_ref().is_none_or(Simulation::is_settled)
    }

    /// Highlights the node with the given id.
    ///
    /// Any previous highlight is cleared first, so at most one node is
    /// highlighted. Returns false if no displayed node has the id.
    pub fn highlight(&mut self, id: &str) -> bool {
        self.highlighted = self.graph.index_of(id);
        self.highlighted.is_some()
    }

    /// Removes the highlight.
    pub fn clear_highlight(&mut self) {
        self.highlighted = None;
    }

    /// Id of the highlighted node.
    #[must_use]
    pub fn highlighted(&self) -> Option<&IdeaId> {
        self.highlighted.map(|idx| &self.graph.nodes[idx].id)
    }

    /// Returns the node under a screen point, if any.
    #[must_use]
    pub fn node_at(&self, sx: f64, sy: f64) -> Option<NodeIdx> {
        let simulation = self.simulation.as_ref()?;
        let (gx, gy) = self.transform.screen_to_graph(sx, sy);
        let r = self.config.node_radius;
        simulation
            .bodies()
            .iter()
            .rposition(|b| (b.x - gx).hypot(b.y - gy) <= r)
    }

    /// Starts dragging a node, pinning it where it is.
    ///
    /// A node already being dragged is released first. Returns false if the
    /// index is out of range.
    pub fn drag_start(&mut self, idx: NodeIdx) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        let Some((x, y)) = simulation.position(idx) else {
            return false;
        };
        match self.dragging {
            None => simulation.set_alpha_target(DRAG_ALPHA_TARGET),
            Some(prev) if prev != idx => simulation.unpin(prev),
            Some(_) => {},
        }
        simulation.pin(idx, x, y);
        self.dragging = Some(idx);
        true
    }

    /// Moves the dragged node to a screen point.
    pub fn drag_to(&mut self, sx: f64, sy: f64) {
        let (Some(idx), Some(simulation)) = (self.dragging, self.simulation.as_mut()) else {
            return;
        };
        let (gx, gy) = self.transform.screen_to_graph(sx, sy);
        simulation.pin(idx, gx, gy);
    }

    /// Releases the dragged node and lets the layout cool.
    pub fn drag_end(&mut self) {
        let Some(idx) = self.dragging.take() else {
            return;
        };
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.unpin(idx);
            simulation.set_alpha_target(0.0);
        }
    }

    /// Current view transform.
    #[must_use]
    pub const fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Zooms in one step about the canvas center.
    pub fn zoom_in(&mut self) {
        self.zoom(ZOOM_STEP);
    }

    /// Zooms out one step about the canvas center.
    pub fn zoom_out(&mut self) {
        self.zoom(1.0 / ZOOM_STEP);
    }

    /// Applies `steps` zoom steps; negative values zoom out.
    pub fn zoom_by(&mut self, steps: i32) {
        for _ in 0..steps.unsigned_abs() {
            if steps > 0 {
                self.zoom_in();
            } else {
                self.zoom_out();
            }
        }
    }

    fn zoom(&mut self, factor: f64) {
        self.transform
            .zoom_about(factor, self.config.width / 2.0, self.config.height / 2.0);
    }

    /// Restores the identity transform.
    pub fn reset_view(&mut self) {
        self.transform = ViewTransform::default();
    }

    /// Node and link counts.
    #[must_use]
    pub fn network_info(&self) -> NetworkInfo {
        NetworkInfo {
            nodes: self.graph.nodes.len(),
            links: self.graph.links.len(),
        }
    }

    /// Builds the current drawable frame.
    #[must_use]
    pub fn scene(&self) -> Scene {
        let positions: Vec<(f64, f64)> = match &self.simulation {
            Some(simulation) => simulation.bodies().iter().map(|b| (b.x, b.y)).collect(),
            None => self.graph.nodes.iter().map(|n| (n.x, n.y)).collect(),
        };

        let nodes = self
            .graph
            .nodes
            .iter()
            .zip(&positions)
            .enumerate()
            .map(|(idx, (node, &(x, y)))| SceneNode {
                id: node.id.clone(),
                title: node.title.clone(),
                label: truncate_label(&node.title, LABEL_MAX_CHARS),
                x,
                y,
                highlighted: self.highlighted == Some(idx),
            })
            .collect();

        let links = self
            .graph
            .links
            .iter()
            .map(|link| {
                let (x1, y1) = positions[link.source];
                let (x2, y2) = positions[link.target];
                SceneLink {
                    source: link.source,
                    target: link.target,
                    x1,
                    y1,
                    x2,
                    y2,
                }
            })
            .collect();

        Scene {
            width: self.config.width,
            height: self.config.height,
            node_radius: self.config.node_radius,
            transform: self.transform,
            nodes,
            links,
            info: self.network_info(),
            settled: self.is_settled(),
        }
    }

    /// Renders the current frame as a standalone SVG document.
    #[must_use]
    pub fn to_svg(&self) -> String {
        self.scene().to_svg()
    }
}

impl Scene {
    /// Renders this frame as a standalone SVG document.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let mut svg = String::with_capacity(512 + self.nodes.len() * 256);
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = self.width,
            h = self.height,
        ));
        svg.push_str(
            "<style>.node.highlighted circle{stroke:#ff6b35;stroke-width:4;fill:#fff3e0}</style>\n",
        );
        let t = self.transform;
        svg.push_str(&format!(
            "<g class=\"view\" transform=\"translate({:.2},{:.2}) scale({:.4})\">\n",
            t.x, t.y, t.k
        ));

        for link in &self.links {
            svg.push_str(&format!(
                "<line class=\"link\" x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#007bff\" stroke-width=\"2\"/>\n",
                link.x1, link.y1, link.x2, link.y2
            ));
        }

        for node in &self.nodes {
            let class = if node.highlighted {
                "node highlighted"
            } else {
                "node"
            };
            svg.push_str(&format!(
                concat!(
                    r#"<g class="{}" data-id="{}" transform="translate({:.1},{:.1})">"#,
                    r##"<circle r="{}" fill="white" stroke="#333" stroke-width="2"/>"##,
                    r##"<text text-anchor="middle" dy=".35em" font-size="12px" fill="#333">{}</text>"##,
                    "<title>{}</title></g>\n"
                ),
                class,
                escape_xml(node.id.as_str()),
                node.x,
                node.y,
                self.node_radius,
                escape_xml(&node.label),
                escape_xml(&node.title),
            ));
        }

        svg.push_str("</g>\n</svg>\n");
        svg
    }
}

/// Shortens a label to `max_chars`, ending it with `...` when cut.
#[must_use]
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
