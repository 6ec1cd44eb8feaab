//! Idea refinement service.
//!
//! Sends raw text plus existing ideas as context to an [`LlmProvider`] and
//! normalises the structured reply into unsaved [`Idea`] payloads.

use crate::llm::{LlmProvider, build_refinement_prompt, extract_json_from_response};
use crate::models::{Idea, IdeaId};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Maximum characters of a title derived from the refined text.
pub const DERIVED_TITLE_CHARS: usize = 50;

/// Service that turns raw text into idea payloads.
#[derive(Clone)]
pub struct RefinementService {
    provider: Arc<dyn LlmProvider>,
}

impl RefinementService {
    /// Creates a refinement service backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Refines `raw_text` into one or more idea payloads.
    ///
    /// Payloads carry a fresh id, a creation time and the raw text; they are
    /// not persisted. Retrying is up to the caller.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `raw_text` is blank or the provider has no
    ///   credential; no request is made in either case
    /// - `ServiceFailed` if the request fails or the reply cannot be parsed
    pub fn refine(&self, raw_text: &str, context: &[Idea]) -> Result<Vec<Idea>> {
        if raw_text.trim().is_empty() {
            return Err(Error::InvalidInput("Idea text cannot be empty".to_string()));
        }
        if !self.provider.is_configured() {
            return Err(Error::InvalidInput(format!(
                "{} provider has no API key configured",
                self.provider.name()
            )));
        }

        let prompt = build_refinement_prompt(raw_text, context);
        tracing::debug!(
            provider = self.provider.name(),
            context_ideas = context.len(),
            prompt_len = prompt.len(),
            "Requesting idea refinement"
        );

        let response = match self.provider.complete_json(&prompt) {
            Ok(response) => response,
            Err(e) => {
                metrics::counter!("santra_refinements_total", "status" => "error").increment(1);
                return Err(e);
            },
        };

        let ideas = parse_refinement(&response, raw_text);
        let status = if ideas.is_ok() { "success" } else { "error" };
        metrics::counter!("santra_refinements_total", "status" => status).increment(1);
        ideas
    }
}

/// One item of the structured reply. Everything is optional here; required
/// fields are checked in [`RefinedItem::into_idea`].
#[derive(Debug, Deserialize)]
struct RefinedItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "content")]
    refined: Option<String>,
    #[serde(default)]
    tags: Value,
    #[serde(default)]
    connections: Value,
    #[serde(default)]
    created: Option<String>,
}

impl RefinedItem {
    fn into_idea(self, index: usize, raw_text: &str, now: DateTime<Utc>) -> Result<Idea> {
        let refined = self
            .refined
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| Error::ServiceFailed {
                operation: "parse_refinement".to_string(),
                cause: format!("item {index} is missing 'refined'"),
            })?;

        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| derive_title(&refined));

        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .map_or_else(IdeaId::generate, IdeaId::new);

        let created = self
            .created
            .as_deref()
            .and_then(|c| DateTime::parse_from_rfc3339(c).ok())
            .map_or(now, |c| c.with_timezone(&Utc));

        Ok(Idea {
            id,
            title,
            content: refined,
            tags: coerce_list(self.tags),
            connections: coerce_list(self.connections),
            created,
            modified: None,
            original: raw_text.to_string(),
            source: String::new(),
        })
    }
}

/// Parses a structured reply into idea payloads.
///
/// Accepts `{"ideas": [...]}`, a bare array, or a single object. Fails as a
/// whole if any item is unusable.
///
/// # Errors
///
/// Returns `ServiceFailed` on malformed JSON, an empty item list, or an item
/// without `refined`.
pub fn parse_refinement(response: &str, raw_text: &str) -> Result<Vec<Idea>> {
    let value: Value = match serde_json::from_str(response.trim()) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(extract_json_from_response(response)).map_err(|e| {
            Error::ServiceFailed {
                operation: "parse_refinement".to_string(),
                cause: format!("Invalid JSON: {e}"),
            }
        })?,
    };

    let items = match value {
        Value::Object(mut map) if map.get("ideas").is_some_and(Value::is_array) => {
            match map.remove("ideas") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        },
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(Error::ServiceFailed {
                operation: "parse_refinement".to_string(),
                cause: format!("expected an object or array, got {other}"),
            });
        },
    };

    if items.is_empty() {
        return Err(Error::ServiceFailed {
            operation: "parse_refinement".to_string(),
            cause: "reply contained no ideas".to_string(),
        });
    }

    let now = Utc::now();
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let item: RefinedItem =
                serde_json::from_value(item).map_err(|e| Error::ServiceFailed {
                    operation: "parse_refinement".to_string(),
                    cause: format!("item {index}: {e}"),
                })?;
            item.into_idea(index, raw_text, now)
        })
        .collect()
}

/// Derives a title from the refined text.
///
/// Whitespace runs collapse to single spaces; text longer than
/// [`DERIVED_TITLE_CHARS`] is cut and marked with `...`.
#[must_use]
pub fn derive_title(refined: &str) -> String {
    let flat = refined.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= DERIVED_TITLE_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(DERIVED_TITLE_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Turns a loosely typed value into a list of strings.
fn coerce_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::String(_) | Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        configured: bool,
        reply: Result<String>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn replying(reply: &str) -> Self {
            Self {
                configured: true,
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl LlmProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(Error::ServiceFailed {
                    operation: "mock".to_string(),
                    cause: e.to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_blank_text_fails_without_call() {
        let provider = Arc::new(MockProvider::replying("{}"));
        let service = RefinementService::new(provider.clone());
        assert!(matches!(service.refine("  \n ", &[]), Err(Error::InvalidInput(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_credential_fails_without_call() {
        let provider = Arc::new(MockProvider {
            configured: false,
            ..MockProvider::replying("{}")
        });
        let service = RefinementService::new(provider.clone());
        assert!(matches!(service.refine("idea", &[]), Err(Error::InvalidInput(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_single_object_reply() {
        let provider = Arc::new(MockProvider::replying(
            r#"{"title": "Orchard", "refined": "Plant apples", "tags": ["garden"], "connections": ["Seed Library"]}"#,
        ));
        let service = RefinementService::new(provider);
        let ideas = service.refine("we should plant apples", &[]).unwrap();

        assert_eq!(ideas.len(), 1);
        let idea = &ideas[0];
        assert_eq!(idea.title, "Orchard");
        assert_eq!(idea.content, "Plant apples");
        assert_eq!(idea.tags, vec!["garden"]);
        assert_eq!(idea.connections, vec!["Seed Library"]);
        assert_eq!(idea.original, "we should plant apples");
        assert!(!idea.id.is_blank());
    }

    #[test]
    fn test_service_error_propagates() {
        let provider = Arc::new(MockProvider {
            reply: Err(Error::InvalidInput("boom".to_string())),
            ..MockProvider::replying("")
        });
        let service = RefinementService::new(provider);
        assert!(matches!(
            service.refine("idea", &[]),
            Err(Error::ServiceFailed { .. })
        ));
    }

    #[test]
    fn test_ideas_envelope_and_bare_array() {
        let envelope = r#"{"ideas": [{"refined": "one"}, {"refined": "two"}]}"#;
        assert_eq!(parse_refinement(envelope, "raw").unwrap().len(), 2);

        let array = r#"[{"refined": "one"}, {"refined": "two"}, {"refined": "three"}]"#;
        let ideas = parse_refinement(array, "raw").unwrap();
        assert_eq!(ideas.len(), 3);
        assert_ne!(ideas[0].id, ideas[1].id);
    }

    #[test]
    fn test_fenced_reply() {
        let reply = "```json\n{\"refined\": \"fenced\"}\n```";
        assert_eq!(parse_refinement(reply, "raw").unwrap()[0].content, "fenced");
    }

    #[test]
    fn test_markdown_body_survives() {
        let body = "## Build script\n\nRun it like this:\n\n```bash\nmake all\n```\n\n> \"Ship it\", they said.\n\n- step one\n- step two";
        let reply = serde_json::json!({
            "title": "Build script",
            "refined": body,
            "tags": ["tooling"],
        })
        .to_string();

        let idea = &parse_refinement(&reply, "raw").unwrap()[0];
        assert_eq!(idea.content, body);
        assert_eq!(idea.title, "Build script");

        let fenced = format!("```json\n{reply}\n```");
        assert_eq!(parse_refinement(&fenced, "raw").unwrap()[0].content, body);

        let chatty = format!("Here you go:\n{reply}");
        assert_eq!(parse_refinement(&chatty, "raw").unwrap()[0].content, body);
    }

    #[test]
    fn test_missing_refined_fails_whole_reply() {
        let reply = r#"[{"refined": "ok"}, {"title": "no body"}]"#;
        assert!(matches!(
            parse_refinement(reply, "raw"),
            Err(Error::ServiceFailed { .. })
        ));
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(matches!(
            parse_refinement("{not json", "raw"),
            Err(Error::ServiceFailed { .. })
        ));
        assert!(matches!(
            parse_refinement("42", "raw"),
            Err(Error::ServiceFailed { .. })
        ));
        assert!(matches!(
            parse_refinement(r#"{"ideas": []}"#, "raw"),
            Err(Error::ServiceFailed { .. })
        ));
    }

    #[test]
    fn test_title_derived_from_refined() {
        let long = "word ".repeat(30);
        let reply = serde_json::json!({ "refined": long }).to_string();
        let idea = &parse_refinement(&reply, "raw").unwrap()[0];
        assert!(idea.title.ends_with("..."));
        assert!(idea.title.chars().count() <= DERIVED_TITLE_CHARS + 3);

        assert_eq!(derive_title("Short\n idea"), "Short idea");
    }

    #[test]
    fn test_supplied_id_and_created_are_kept() {
        let reply = r#"{"id": "given-id", "created": "2024-05-01T10:00:00Z", "refined": "x"}"#;
        let idea = &parse_refinement(reply, "raw").unwrap()[0];
        assert_eq!(idea.id.as_str(), "given-id");
        assert_eq!(idea.created.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_scalar_lists_are_coerced() {
        let reply = r#"{"refined": "x", "tags": "solo", "connections": 7}"#;
        let idea = &parse_refinement(reply, "raw").unwrap()[0];
        assert_eq!(idea.tags, vec!["solo"]);
        assert!(idea.connections.is_empty());
    }
}
