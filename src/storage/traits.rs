//! Idea store trait.

use crate::models::{Idea, IdeaSummary};
use crate::{Error, Result};

/// Trait for idea storage backends.
///
/// Backends are the source of truth for ideas. Bulk reads skip records that
/// cannot be decoded instead of failing the whole listing.
pub trait IdeaStore: Send + Sync {
    /// Lists summaries of every stored idea, newest first.
    fn list_all(&self) -> Result<Vec<IdeaSummary>>;

    /// Loads one idea.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no idea is stored under `id`.
    fn load_one(&self, id: &str) -> Result<Idea>;

    /// Loads the stored text of one idea, header included.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no idea is stored under `id`.
    fn load_raw(&self, id: &str) -> Result<String>;

    /// Persists an idea, replacing any previous version, and returns its
    /// storage key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the id, title or content is blank.
    fn save(&self, idea: &Idea) -> Result<String>;

    /// Loads every stored idea with its body, newest first.
    fn load_all_full(&self) -> Result<Vec<Idea>>;

    /// Returns true if something is stored under `id`.
    ///
    /// Read errors other than `NotFound` count as taken.
    fn exists(&self, id: &str) -> bool {
        !matches!(self.load_raw(id), Err(Error::NotFound(_)))
    }

    /// Returns the number of stored ideas.
    fn count(&self) -> Result<usize> {
        Ok(self.list_all()?.len())
    }
}
