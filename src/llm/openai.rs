//! `OpenAI` client.

use super::{LlmHttpConfig, LlmProvider, build_http_client};
use crate::config::LlmConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// `OpenAI` LLM client.
///
/// Works with any server that speaks the Chat Completions API.
pub struct OpenAiClient {
    /// API key.
    api_key: Option<String>,
    /// API endpoint.
    endpoint: String,
    /// Model to use.
    model: String,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    /// Environment variable holding the API key.
    pub const API_KEY_ENV: &'static str = "OPENAI_API_KEY";

    /// Creates a new `OpenAI` client, reading the key from the environment.
    #[must_use]
    pub fn new() -> Self {
        let api_key = std::env::var(Self::API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            api_key,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Creates a client from configuration.
    ///
    /// Values missing from the config fall back to the defaults; the key
    /// falls back to `OPENAI_API_KEY`.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut client = Self::new();
        client.client = build_http_client(LlmHttpConfig::from_config(config));
        if let Some(key) = config.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            client.api_key = Some(key.clone());
        }
        if let Some(ref endpoint) = config.base_url {
            client.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(ref model) = config.model {
            client.model.clone_from(model);
        }
        client
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Removes the API key.
    #[must_use]
    pub fn without_api_key(mut self) -> Self {
        self.api_key = None;
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Returns the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a request to the Chat Completions API.
    fn request(&self, messages: Vec<ChatMessage>, json_mode: bool) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            Error::InvalidInput(format!("{} not set", Self::API_KEY_ENV))
        })?;

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            response_format: json_mode.then(|| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        };

        tracing::debug!(model = %self.model, json_mode, "Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| Error::ServiceFailed {
                operation: "openai_request".to_string(),
                cause: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::ServiceFailed {
                operation: "openai_request".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let response: ChatCompletionResponse =
            response.json().map_err(|e| Error::ServiceFailed {
                operation: "openai_response".to_string(),
                cause: e.to_string(),
            })?;

        first_choice_content(response)
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.request(vec![ChatMessage::user(prompt)], false)
    }

    fn complete_json(&self, prompt: &str) -> Result<String> {
        self.request(vec![ChatMessage::user(prompt)], true)
    }
}

/// Extracts the message content of the first choice.
fn first_choice_content(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::ServiceFailed {
            operation: "openai_response".to_string(),
            cause: "No choices in response".to_string(),
        })
}

/// Request to the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Structured output switch.
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

/// A message in the chat.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.to_string()),
        }
    }
}

/// Response from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
