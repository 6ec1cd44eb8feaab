//! Force-directed layout.
//!
//! A velocity Verlet integrator with link, many-body, centering and
//! collision forces. Alpha cools geometrically toward `alpha_target`; the
//! layout is settled once alpha drops below `alpha_min`. Nothing here runs
//! on its own: callers drive it with [`Simulation::tick`].

use crate::models::{Graph, NodeIdx};

/// Layout parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Canvas width; the centering force pulls toward `width / 2`.
    pub width: f64,
    /// Canvas height; the centering force pulls toward `height / 2`.
    pub height: f64,
    /// Drawn node radius.
    pub node_radius: f64,
    /// Rest length of a link.
    pub link_distance: f64,
    /// Many-body strength; negative values repel.
    pub charge_strength: f64,
    /// Extra clearance added to the node radius for collisions.
    pub collide_padding: f64,
    /// Alpha below which the layout is settled.
    pub alpha_min: f64,
    /// Fraction of the distance to `alpha_target` covered per tick.
    pub alpha_decay: f64,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f64;
        Self {
            width: 800.0,
            height: 600.0,
            node_radius: 30.0,
            link_distance: 100.0,
            charge_strength: -800.0,
            collide_padding: 10.0,
            alpha_min,
            // Reaches alpha_min from 1 in 300 ticks.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
        }
    }
}

impl SimulationConfig {
    /// Returns a config for a canvas of the given size.
    #[must_use]
    pub fn with_canvas(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    fn collide_radius(&self) -> f64 {
        self.node_radius + self.collide_padding
    }
}

/// Position and velocity of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    /// Position (x).
    pub x: f64,
    /// Position (y).
    pub y: f64,
    /// Velocity (x).
    pub vx: f64,
    /// Velocity (y).
    pub vy: f64,
    /// Pinned position (x).
    pub fx: Option<f64>,
    /// Pinned position (y).
    pub fy: Option<f64>,
}

impl Body {
    fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

/// Precomputed link with degree-derived strength and bias.
#[derive(Debug, Clone, Copy)]
struct Spring {
    source: NodeIdx,
    target: NodeIdx,
    strength: f64,
    bias: f64,
}

/// Tiny displacement used to separate coincident nodes.
///
/// Deterministic so that layouts are reproducible.
#[derive(Debug, Clone)]
struct Jiggle(u64);

impl Jiggle {
    fn sample(&mut self) -> f64 {
        // xorshift64
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        #[allow(clippy::cast_precision_loss)]
        let unit = (self.0 >> 11) as f64 / (1_u64 << 53) as f64;
        (unit - 0.5) * 1e-6
    }
}

/// Force simulation over one graph.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    alpha: f64,
    alpha_target: f64,
    jiggle: Jiggle,
}

impl Simulation {
    /// Seeds a simulation from the graph's node positions.
    #[must_use]
    pub fn new(graph: &Graph, config: SimulationConfig) -> Self {
        let bodies: Vec<Body> = graph.nodes.iter().map(|n| Body::at(n.x, n.y)).collect();

        let mut degree = vec![0_u32; bodies.len()];
        for link in &graph.links {
            degree[link.source] += 1;
            degree[link.target] += 1;
        }

        let springs = graph
            .links
            .iter()
            .map(|link| {
                let s = f64::from(degree[link.source]);
                let t = f64::from(degree[link.target]);
                Spring {
                    source: link.source,
                    target: link.target,
                    strength: 1.0 / s.min(t),
                    bias: s / (s + t),
                }
            })
            .collect();

        Self {
            config,
            bodies,
            springs,
            alpha: 1.0,
            alpha_target: 0.0,
            jiggle: Jiggle(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Returns the layout parameters.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current alpha.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Sets the temperature alpha cools toward.
    ///
    /// A target above `alpha_min` keeps the simulation running until it is
    /// lowered again.
    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    /// Returns true once alpha has cooled below `alpha_min`.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    /// Node states, indexed like the graph's nodes.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Current position of a node.
    #[must_use]
    pub fn position(&self, idx: NodeIdx) -> Option<(f64, f64)> {
        self.bodies.get(idx).map(|b| (b.x, b.y))
    }

    /// Holds a node at a fixed position.
    pub fn pin(&mut self, idx: NodeIdx, x: f64, y: f64) {
        if let Some(body) = self.bodies.get_mut(idx) {
            body.fx = Some(x);
            body.fy = Some(y);
        }
    }

    /// Releases a pinned node.
    pub fn unpin(&mut self, idx: NodeIdx) {
        if let Some(body) = self.bodies.get_mut(idx) {
            body.fx = None;
            body.fy = None;
        }
    }

    /// Advances the simulation by one step.
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        self.apply_links();
        self.apply_charge();
        self.apply_center();
        self.apply_collide();

        let retain = 1.0 - self.config.velocity_decay;
        for body in &mut self.bodies {
            match body.fx {
                Some(fx) => {
                    body.x = fx;
                    body.vx = 0.0;
                },
                None => {
                    body.vx *= retain;
                    body.x += body.vx;
                },
            }
            match body.fy {
                Some(fy) => {
                    body.y = fy;
                    body.vy = 0.0;
                },
                None => {
                    body.vy *= retain;
                    body.y += body.vy;
                },
            }
        }
    }

    /// Ticks until settled or `max_ticks` is reached.
    ///
    /// Returns the number of ticks run.
    pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_settled() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    fn apply_links(&mut self) {
        let alpha = self.alpha;
        let distance = self.config.link_distance;
        for spring in &self.springs {
            let s = self.bodies[spring.source];
            let t = self.bodies[spring.target];

            let mut x = t.x + t.vx - s.x - s.vx;
            if x == 0.0 {
                x = self.jiggle.sample();
            }
            let mut y = t.y + t.vy - s.y - s.vy;
            if y == 0.0 {
                y = self.jiggle.sample();
            }

            let l = x.hypot(y);
            let k = (l - distance) / l * alpha * spring.strength;
            let (x, y) = (x * k, y * k);

            let target = &mut self.bodies[spring.target];
            target.vx -= x * spring.bias;
            target.vy -= y * spring.bias;
            let source = &mut self.bodies[spring.source];
            source.vx += x * (1.0 - spring.bias);
            source.vy += y * (1.0 - spring.bias);
        }
    }

    fn apply_charge(&mut self) {
        const DISTANCE_MIN2: f64 = 1.0;
        let w = self.config.charge_strength * self.alpha;
        let n = self.bodies.len();

        for i in 0..n {
            let (xi, yi) = (self.bodies[i].x, self.bodies[i].y);
            let (mut dvx, mut dvy) = (0.0, 0.0);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut x = self.bodies[j].x - xi;
                let mut y = self.bodies[j].y - yi;
                let mut l = x * x + y * y;
                if x == 0.0 {
                    x = self.jiggle.sample();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.jiggle.sample();
                    l += y * y;
                }
                if l < DISTANCE_MIN2 {
                    l = (DISTANCE_MIN2 * l).sqrt();
                }
                dvx += x * w / l;
                dvy += y * w / l;
            }
            self.bodies[i].vx += dvx;
            self.bodies[i].vy += dvy;
        }
    }

    fn apply_center(&mut self) {
        if self.bodies.is_empty() {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.bodies.len() as f64;
        let (sx, sy) = self
            .bodies
            .iter()
            .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
        let dx = sx / n - self.config.width / 2.0;
        let dy = sy / n - self.config.height / 2.0;
        for body in &mut self.bodies {
            body.x -= dx;
            body.y -= dy;
        }
    }

    fn apply_collide(&mut self) {
        let radius = self.config.collide_radius();
        let r = radius * 2.0;
        let n = self.bodies.len();

        for i in 0..n {
            let xi = self.bodies[i].x + self.bodies[i].vx;
            let yi = self.bodies[i].y + self.bodies[i].vy;
            for j in (i + 1)..n {
                let other = self.bodies[j];
                let mut x = xi - other.x - other.vx;
                let mut y = yi - other.y - other.vy;
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.jiggle.sample();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.jiggle.sample();
                    l += y * y;
                }
                let d = l.sqrt();
                let k = (r - d) / d;
                let (x, y) = (x * k, y * k);
                // Equal radii split the correction evenly.
                self.bodies[i].vx += x * 0.5;
                self.bodies[i].vy += y * 0.5;
                self.bodies[j].vx -= x * 0.5;
                self.bodies[j].vy -= y * 0.5;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GraphLink, GraphNode, IdeaId};

    fn graph(n: usize, links: &[(usize, usize)]) -> Graph {
        let positions = crate::graph::grid_positions(n, crate::graph::GRID_SPACING);
        Graph {
            nodes: positions
                .into_iter()
                .enumerate()
                .map(|(i, (x, y))| GraphNode {
                    id: IdeaId::new(format!("n{i}")),
                    title: format!("Node {i}"),
                    connections: Vec::new(),
                    x,
                    y,
                })
                .collect(),
            links: links
                .iter()
                .map(|&(source, target)| GraphLink { source, target })
                .collect(),
        }
    }

    fn distance(sim: &Simulation, a: NodeIdx, b: NodeIdx) -> f64 {
        let (ax, ay) = sim.position(a).unwrap();
        let (bx, by) = sim.position(b).unwrap();
        (ax - bx).hypot(ay - by)
    }

    #[test]
    fn test_default_decay_settles_in_300_ticks() {
        let mut sim = Simulation::new(&graph(1, &[]), SimulationConfig::default());
        let ticks = sim.run_until_settled(10_000);
        assert!((299..=301).contains(&ticks), "ticks = {ticks}");
        assert!(sim.is_settled());
    }

    #[test]
    fn test_settles_with_finite_positions() {
        let mut sim = Simulation::new(
            &graph(6, &[(0, 1), (1, 2), (2, 0), (3, 4)]),
            SimulationConfig::default(),
        );
        sim.run_until_settled(1_000);
        assert!(sim.is_settled());
        for body in sim.bodies() {
            assert!(body.x.is_finite() && body.y.is_finite());
        }
    }

    #[test]
    fn test_empty_graph_ticks() {
        let mut sim = Simulation::new(&Graph::default(), SimulationConfig::default());
        sim.tick();
        assert!(sim.bodies().is_empty());
    }

    #[test]
    fn test_coincident_nodes_separate() {
        let mut g = graph(2, &[]);
        g.nodes[1].x = g.nodes[0].x;
        g.nodes[1].y = g.nodes[0].y;
        let mut sim = Simulation::new(&g, SimulationConfig::default());
        sim.run_until_settled(1_000);
        assert!(distance(&sim, 0, 1) > 1.0);
    }

    #[test]
    fn test_pinned_node_stays_put() {
        let mut sim = Simulation::new(&graph(4, &[(0, 1), (0, 2)]), SimulationConfig::default());
        sim.pin(0, 50.0, 75.0);
        sim.run_until_settled(1_000);
        assert_eq!(sim.position(0), Some((50.0, 75.0)));

        sim.unpin(0);
        assert_eq!(sim.bodies()[0].fx, None);
    }

    #[test]
    fn test_linked_nodes_end_closer() {
        let mut sim = Simulation::new(&graph(3, &[(0, 1)]), SimulationConfig::default());
        sim.run_until_settled(1_000);
        let linked = distance(&sim, 0, 1);
        assert!(linked < distance(&sim, 0, 2));
        assert!(linked < distance(&sim, 1, 2));
    }

    #[test]
    fn test_centroid_is_canvas_center() {
        let mut sim = Simulation::new(&graph(5, &[(0, 4)]), SimulationConfig::with_canvas(1000.0, 500.0));
        sim.run_until_settled(1_000);
        let (sx, sy) = sim
            .bodies()
            .iter()
            .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
        assert!((sx / 5.0 - 500.0).abs() < 1.0);
        assert!((sy / 5.0 - 250.0).abs() < 1.0);
    }

    #[test]
    fn test_alpha_target_keeps_running() {
        let mut sim = Simulation::new(&graph(2, &[(0, 1)]), SimulationConfig::default());
        sim.set_alpha_target(0.3);
        sim.run_until_settled(2_000);
        assert!(!sim.is_settled());
        assert!((sim.alpha() - 0.3).abs() < 0.01);

        sim.set_alpha_target(0.0);
        sim.run_until_settled(2_000);
        assert!(sim.is_settled());
    }
}
