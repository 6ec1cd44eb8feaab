//! Business logic services.
//!
//! - [`RefinementService`]: raw text to idea payloads via an LLM
//! - [`IdeaService`]: submission pipeline and read access

mod ideas;
mod refinement;

pub use ideas::{IdeaService, ProcessOutcome};
pub use refinement::{DERIVED_TITLE_CHARS, RefinementService, derive_title, parse_refinement};
