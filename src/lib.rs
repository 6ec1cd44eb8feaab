//! # Santra
//!
//! Capture free-text ideas, refine them with a language model and browse them
//! as a connection graph.
//!
//! Ideas are persisted as markdown files with a frontmatter header. Each idea
//! carries free-text connections to other ideas' titles; those are resolved
//! into links at render time and laid out with a force simulation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use santra::services::IdeaService;
//! use santra::storage::FilesystemIdeaStore;
//! use santra::llm::OpenAiClient;
//!
//! let store = FilesystemIdeaStore::new("ideas");
//! let service = IdeaService::new(Arc::new(store), Arc::new(OpenAiClient::new()));
//! let outcome = service.process("A community orchard on the old rail yard", "cli")?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod graph;
pub mod llm;
pub mod models;
pub mod observability;
pub mod server;
pub mod services;
pub mod storage;

pub use config::SantraConfig;
pub use llm::LlmProvider;
pub use models::{GraphLink, GraphNode, Idea, IdeaId, IdeaSummary};
pub use services::{IdeaService, RefinementService};
pub use storage::{FilesystemIdeaStore, IdeaStore};

/// Error type for santra operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Blank idea text, missing credential, record missing title/content |
/// | `ServiceFailed` | Refinement service unreachable, non-success status, unparseable reply |
/// | `NotFound` | No idea stored under the requested identifier |
/// | `OperationFailed` | Filesystem reads/writes fail, server cannot bind |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - The submitted idea text is empty or whitespace only
    /// - The refinement credential is not configured
    /// - A record is saved without an id, title or content
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The remote refinement service failed.
    ///
    /// Raised when:
    /// - The HTTP request cannot be sent
    /// - The service answers with a non-success status
    /// - The reply cannot be parsed into idea payloads
    #[error("service '{operation}' failed: {cause}")]
    ServiceFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The referenced idea does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A local operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O errors occur
    /// - Every item of a multi-idea submission failed to persist
    /// - The HTTP listener cannot be started
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for santra operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::ServiceFailed {
            operation: "openai_request".to_string(),
            cause: "status 500".to_string(),
        };
        assert_eq!(err.to_string(), "service 'openai_request' failed: status 500");

        let err = Error::NotFound("idea abc".to_string());
        assert_eq!(err.to_string(), "not found: idea abc");
    }
}
