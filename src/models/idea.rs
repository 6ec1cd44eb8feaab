//! Idea records and identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an idea.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdeaId(String);

impl IdeaId {
    /// Creates an idea ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for IdeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IdeaId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IdeaId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A captured and refined idea.
///
/// The same type is used for payloads fresh from the refinement service and
/// for records reconstructed from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    /// Unique identifier, immutable once assigned.
    pub id: IdeaId,
    /// Short display title.
    pub title: String,
    /// Refined markdown body.
    #[serde(rename = "refined", alias = "content")]
    pub content: String,
    /// Short tags, in order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-text references to other ideas' titles.
    #[serde(default)]
    pub connections: Vec<String>,
    /// Creation time, immutable.
    pub created: DateTime<Utc>,
    /// Time of the last rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// The raw input text that produced this idea.
    #[serde(default)]
    pub original: String,
    /// Which entry point created the idea.
    #[serde(default)]
    pub source: String,
}

impl Idea {
    /// Returns the listing summary of this idea.
    #[must_use]
    pub fn summary(&self) -> IdeaSummary {
        IdeaSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            tags: self.tags.clone(),
            connections: self.connections.clone(),
            created: self.created,
        }
    }
}

/// The subset of an idea used for listing and graph building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaSummary {
    /// Unique identifier.
    pub id: IdeaId,
    /// Display title.
    pub title: String,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-text connections.
    #[serde(default)]
    pub connections: Vec<String>,
    /// Creation time.
    pub created: DateTime<Utc>,
}
