/// Ollama HTTP client module.
///
/// This module provides a blocking HTTP client for the Ollama chat API,
/// including error handling and timeout configuration.
mod client;

pub use client::{ChatMessage, OllamaClient, OllamaClientBuilder, OllamaClientTrait, OllamaError, Role};
