//! Idea submission and browsing.
//!
//! Ties the refinement service to the store: a submission is refined into
//! one or more payloads and each payload is saved on its own, so one bad
//! write does not lose the others.

use super::RefinementService;
use crate::graph::resolve;
use crate::llm::LlmProvider;
use crate::models::{Graph, Idea, IdeaId, IdeaSummary};
use crate::storage::IdeaStore;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of processing one submission.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    /// Ideas that were saved, in reply order.
    pub saved: Vec<Idea>,
    /// Number of ideas that failed to save.
    pub failed: usize,
}

/// Service for submitting and reading ideas.
#[derive(Clone)]
pub struct IdeaService {
    store: Arc<dyn IdeaStore>,
    refiner: RefinementService,
}

impl IdeaService {
    /// Creates a new idea service.
    #[must_use]
    pub fn new(store: Arc<dyn IdeaStore>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            store,
            refiner: RefinementService::new(provider),
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn IdeaStore> {
        &self.store
    }

    /// Refines `raw_text` and saves every resulting idea.
    ///
    /// Existing ideas are passed to the refiner as context; if they cannot be
    /// loaded the refinement proceeds without context.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for blank text or a missing credential
    /// - `ServiceFailed` if refinement fails
    /// - `OperationFailed` if none of the ideas could be saved
    pub fn process(&self, raw_text: &str, source: &str) -> Result<ProcessOutcome> {
        if raw_text.trim().is_empty() {
            return Err(Error::InvalidInput("Idea text cannot be empty".to_string()));
        }

        let context = self.store.load_all_full().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not load existing ideas for context");
            Vec::new()
        });

        let mut ideas = self.refiner.refine(raw_text, &context)?;
        for idea in &mut ideas {
            if idea.source.is_empty() {
                idea.source = source.to_string();
            }
        }

        self.save_all(ideas)
    }

    /// Saves each idea independently.
    ///
    /// An id already used earlier in the batch or already present in the
    /// store is replaced with a fresh one, so a save never overwrites another
    /// idea.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` only if every idea failed to save.
    pub fn save_all(&self, ideas: Vec<Idea>) -> Result<ProcessOutcome> {
        let total = ideas.len();
        let mut saved = Vec::with_capacity(total);
        let mut failed = 0;
        let mut last_error = None;
        let mut taken: HashSet<IdeaId> = HashSet::with_capacity(total);

        for mut idea in ideas {
            if taken.contains(&idea.id) || self.store.exists(idea.id.as_str()) {
                let fresh = IdeaId::generate();
                tracing::warn!(
                    id = %idea.id,
                    new_id = %fresh,
                    "Idea id already taken, assigning a fresh one"
                );
                idea.id = fresh;
            }
            taken.insert(idea.id.clone());

            match self.store.save(&idea) {
                Ok(key) => {
                    tracing::info!(id = %key, title = %idea.title, "Idea saved");
                    metrics::counter!("santra_ideas_saved_total", "status" => "success")
                        .increment(1);
                    saved.push(idea);
                },
                Err(e) => {
                    tracing::error!(id = %idea.id, error = %e, "Failed to save idea");
                    metrics::counter!("santra_ideas_saved_total", "status" => "error")
                        .increment(1);
                    failed += 1;
                    last_error = Some(e);
                },
            }
        }

        if saved.is_empty() && total > 0 {
            let cause = last_error.map_or_else(String::new, |e| e.to_string());
            return Err(Error::OperationFailed {
                operation: "save_ideas".to_string(),
                cause: format!("all {total} ideas failed to save: {cause}"),
            });
        }

        Ok(ProcessOutcome { saved, failed })
    }

    /// Lists summaries of every idea.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed.
    pub fn list(&self) -> Result<Vec<IdeaSummary>> {
        self.store.list_all()
    }

    /// Loads one idea.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the idea does not exist.
    pub fn get(&self, id: &str) -> Result<Idea> {
        self.store.load_one(id)
    }

    /// Loads the stored markdown of one idea.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the idea does not exist.
    pub fn raw(&self, id: &str) -> Result<String> {
        self.store.load_raw(id)
    }

    /// Builds the connection graph over the current collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed.
    pub fn graph(&self) -> Result<Graph> {
        Ok(resolve(&self.list()?))
    }
}
