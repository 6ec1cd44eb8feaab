//! Idea persistence.
//!
//! Ideas live one per markdown file; the [`frontmatter`] codec handles the
//! header and [`FilesystemIdeaStore`] handles the collection.

pub mod filesystem;
pub mod frontmatter;
pub mod traits;

pub use filesystem::FilesystemIdeaStore;
pub use traits::IdeaStore;
