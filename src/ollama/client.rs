/// Ollama HTTP client implementation.
///
/// This module provides `OllamaClient` for making synchronous chat requests to the Ollama API,
/// along with the message types, error types and builder used to configure it.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when interacting with the Ollama API.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Ollama API-specific errors
    #[error("Ollama API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl OllamaError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message in a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Creates a `user` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Builder for constructing `OllamaClient` instances.
///
/// # Examples
///
/// ```
/// use askweb::ollama::OllamaClientBuilder;
///
/// let client = OllamaClientBuilder::new()
///     .base_url("http://localhost:11434")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct OllamaClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl OllamaClientBuilder {
    /// Creates a new `OllamaClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Ollama API.
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL (e.g., "http://localhost:11434")
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets a total request timeout. Requests wait indefinitely when unset.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `OllamaClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, this method will check the `OLLAMA_HOST`
    /// environment variable. If not set, it defaults to `http://localhost:11434`.
    pub fn build(self) -> Result<OllamaClient, OllamaError> {
        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string())
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        reqwest::Url::parse(&base_url)
            .map_err(|e| OllamaError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(OllamaError::Network)?;

        Ok(OllamaClient { client, base_url })
    }
}

/// Synchronous HTTP client for interacting with the Ollama API.
///
/// It should be constructed using `OllamaClientBuilder`.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

/// Trait for Ollama API client operations.
///
/// This trait enables mocking in unit tests and provides a clean interface
/// for interacting with the Ollama API.
pub trait OllamaClientTrait: Send + Sync {
    /// Sends a non-streaming chat request and returns the reply's message content.
    ///
    /// # Arguments
    ///
    /// * `model` - The name of the model to use (e.g., "llama3.2:3b")
    /// * `messages` - The conversation so far, oldest first
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, OllamaError>;
}

impl OllamaClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists available models from the Ollama API, sorted by size (largest first).
    ///
    /// Fetches the `/api/tags` endpoint and returns model names.
    pub fn list_models(&self) -> Result<Vec<String>, OllamaError> {
        let url = format!("{}/api/tags", self.base_url);
        debug!(%url, "listing ollama models");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(OllamaError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(OllamaError::Http {
                status: response.status().as_u16(),
            });
        }

        let json: serde_json::Value = response.json().map_err(OllamaError::Network)?;

        let mut models: Vec<(String, u64)> = json
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| {
                        let name = model.get("name").and_then(|n| n.as_str())?;
                        let size = model.get("size").and_then(|s| s.as_u64()).unwrap_or(0);
                        Some((name.to_string(), size))
                    })
                    .collect()
            })
            .unwrap_or_default();

        models.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(models.into_iter().map(|(name, _)| name).collect())
    }

    fn chat_internal(&self, model: &str, messages: &[ChatMessage]) -> Result<String, OllamaError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model,
            messages,
            stream: false,
        };
        debug!(%url, model, messages = messages.len(), "sending chat request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(OllamaError::from_reqwest)?;

        let status = response.status();
        let body = response.text().map_err(OllamaError::from_reqwest)?;

        if !status.is_success() {
            // Ollama reports failures such as unknown models as {"error": "..."}
            return Err(match error_message(&body) {
                Some(message) => OllamaError::Api { message },
                None => OllamaError::Http {
                    status: status.as_u16(),
                },
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(OllamaError::Serialization)?;

        json.get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| OllamaError::Api {
                message: "Missing 'message.content' field in API response".to_string(),
            })
    }
}

impl OllamaClientTrait for OllamaClient {
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, OllamaError> {
        self.chat_internal(model, messages)
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_string)
}
