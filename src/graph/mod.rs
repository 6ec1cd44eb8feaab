//! Connection graph.
//!
//! [`resolve`] turns idea summaries into nodes and deduplicated links,
//! [`Simulation`] relaxes the grid seed with a force layout, and
//! [`RenderContext`] owns one displayed graph with its interaction state.

mod layout;
mod render;
mod resolver;
mod simulation;

pub use layout::{GRID_SPACING, grid_positions};
pub use render::{
    LABEL_MAX_CHARS, MAX_SETTLE_TICKS, NetworkInfo, RenderContext, Scene, SceneLink, SceneNode,
    ViewTransform, truncate_label,
};
pub use resolver::{MATCHERS, Matcher, exact_title, find_target, keyword_overlap, resolve, substring};
pub use simulation::{Body, Simulation, SimulationConfig};
