//! LLM client abstraction.
//!
//! The refinement service talks to a provider through [`LlmProvider`]; the
//! only shipped provider is the OpenAI-compatible [`OpenAiClient`].

mod openai;
pub mod system_prompt;

pub use openai::OpenAiClient;
pub use system_prompt::{CONTEXT_EXCERPT_CHARS, REFINEMENT_PROMPT, build_refinement_prompt};

use crate::Result;
use std::time::Duration;

/// Trait for LLM providers.
pub trait LlmProvider: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Returns true if the provider has the credential it needs.
    ///
    /// Callers check this before building a request so that a missing key
    /// never costs a network round trip.
    fn is_configured(&self) -> bool;

    /// Generates a completion for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Generates a completion constrained to a JSON document.
    ///
    /// Default implementation defers to [`complete`](Self::complete);
    /// providers with a native structured-output switch override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    fn complete_json(&self, prompt: &str) -> Result<String> {
        self.complete(prompt)
    }
}

/// HTTP client configuration for LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            connect_timeout_ms: 5_000,
        }
    }
}

impl LlmHttpConfig {
    /// Loads HTTP configuration from config file settings.
    #[must_use]
    pub fn from_config(config: &crate::config::LlmConfig) -> Self {
        let mut settings = Self::default();
        if let Some(timeout_ms) = config.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
        if let Some(connect_timeout_ms) = config.connect_timeout_ms {
            settings.connect_timeout_ms = connect_timeout_ms;
        }
        settings
    }
}

/// Builds a blocking HTTP client for LLM requests with configured timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build LLM HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

/// Extracts JSON from an LLM response, handling markdown code blocks.
///
/// A fence is only unwrapped when the reply starts with it; fences inside
/// JSON string values are left alone. Otherwise objects and arrays are both
/// recognised and whichever opens first wins.
#[must_use]
pub fn extract_json_from_response(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` and bare ``` ... ``` wrappers
    if let Some(after_marker) = trimmed.strip_prefix("```") {
        let after_lang = after_marker
            .strip_prefix("json")
            .unwrap_or(after_marker);
        if let Some(end) = after_lang.rfind("```") {
            return after_lang[..end].trim();
        }
    }

    let object = trimmed.find('{').zip(trimmed.rfind('}'));
    let array = trimmed.find('[').zip(trimmed.rfind(']'));
    let span = match (object, array) {
        (Some(o), Some(a)) => Some(if a.0 < o.0 { a } else { o }),
        (o, a) => o.or(a),
    };

    match span {
        Some((start, end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
