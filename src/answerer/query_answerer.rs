//! Search, assemble and generate.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{Config, ConfigError, DEFAULT_NUM_RESULTS, OLLAMA_HOST_VAR, SERPAPI_KEY_VAR, SERPAPI_URL_VAR};
use crate::ollama::{ChatMessage, OllamaClientBuilder, OllamaClientTrait, OllamaError};
use crate::search::{SearchClientBuilder, SearchClientTrait, SearchError, SearchResult};

use super::types::{AnswerReport, Generation};

/// Builds the prompt sent to the model.
///
/// `query` and `context` are embedded verbatim.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "Based on the user query and context, provide a helpful answer.\n\
         \n\
         Query: {query}\n\
         Context: {context}\n\
         \n\
         Please provide a comprehensive answer that addresses the query using the context provided.\n\
         \n\
         Answer:"
    )
}

/// Joins results as `"{title}: {snippet}"` lines, preserving order.
pub fn assemble_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| format!("{}: {}", result.title, result.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builder for constructing `QueryAnswerer` instances.
#[derive(Default)]
pub struct QueryAnswererBuilder {
    search: Option<Arc<dyn SearchClientTrait>>,
    client: Option<Arc<dyn OllamaClientTrait>>,
    model: Option<String>,
    num_results: Option<usize>,
}

impl QueryAnswererBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the web search client.
    pub fn search(mut self, search: Arc<dyn SearchClientTrait>) -> Self {
        self.search = Some(search);
        self
    }

    /// Sets the Ollama client to use.
    pub fn client(mut self, client: Arc<dyn OllamaClientTrait>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the model identifier passed to every chat request.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets how many search results feed the context. Defaults to 3.
    pub fn num_results(mut self, num_results: usize) -> Self {
        self.num_results = Some(num_results);
        self
    }

    /// Builds the `QueryAnswerer`.
    pub fn build(self) -> Result<QueryAnswerer, ConfigError> {
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or(ConfigError::MissingModel)?;

        Ok(QueryAnswerer {
            search: self.search.ok_or(ConfigError::MissingComponent("search client"))?,
            client: self.client.ok_or(ConfigError::MissingComponent("ollama client"))?,
            model,
            num_results: self.num_results.unwrap_or(DEFAULT_NUM_RESULTS),
        })
    }
}

/// Answers questions from live web search results.
pub struct QueryAnswerer {
    search: Arc<dyn SearchClientTrait>,
    client: Arc<dyn OllamaClientTrait>,
    model: String,
    num_results: usize,
}

impl QueryAnswerer {
    /// Creates a `QueryAnswerer` backed by SerpAPI and Ollama.
    ///
    /// Fails before any network call when the API key or model is missing.
    /// `timeout` bounds each HTTP request; `None` waits indefinitely.
    pub fn from_config(config: &Config, timeout: Option<Duration>) -> Result<Self, ConfigError> {
        let model = config.require_model()?;

        let mut search = SearchClientBuilder::new()
            .api_key(&config.serpapi_key)
            .base_url(&config.search_url)
            .engine(&config.search_engine);
        let mut ollama = OllamaClientBuilder::new().base_url(&config.ollama_host);
        if let Some(timeout) = timeout {
            search = search.timeout(timeout);
            ollama = ollama.timeout(timeout);
        }

        let search = search.build().map_err(|e| match e {
            SearchError::MissingApiKey => ConfigError::MissingApiKey(SERPAPI_KEY_VAR),
            SearchError::InvalidUrl(reason) => ConfigError::InvalidUrl {
                name: SERPAPI_URL_VAR,
                reason,
            },
            other => ConfigError::HttpClient(other.to_string()),
        })?;
        let ollama = ollama.build().map_err(|e| match e {
            OllamaError::InvalidUrl(reason) => ConfigError::InvalidUrl {
                name: OLLAMA_HOST_VAR,
                reason,
            },
            other => ConfigError::HttpClient(other.to_string()),
        })?;

        QueryAnswererBuilder::new()
            .search(Arc::new(search))
            .client(Arc::new(ollama))
            .model(model)
            .num_results(config.num_results)
            .build()
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns how many search results feed the context.
    pub fn num_results(&self) -> usize {
        self.num_results
    }

    /// Searches the web for `query`, returning at most `num_results` results.
    ///
    /// Search failures propagate to the caller.
    pub fn search_web(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.search.search(query, num_results)
    }

    /// Asks the model to answer `query` from `context`.
    pub fn generate(&self, query: &str, context: &str) -> Generation {
        let prompt = build_prompt(query, context);

        match self.client.chat(&self.model, &[ChatMessage::user(prompt)]) {
            Ok(answer) => Generation::Answer(answer),
            Err(e) => {
                warn!(model = %self.model, error = %e, "generation failed");
                Generation::Failed(e.to_string())
            }
        }
    }

    /// Like [`generate`](Self::generate), but folds failures into the returned text.
    ///
    /// Never fails: a model error yields `"Error generating response: {details}"`.
    pub fn generate_response(&self, query: &str, context: &str) -> String {
        self.generate(query, context).into_text()
    }

    /// Runs search, context assembly and generation for one query.
    pub fn answer(&self, query: &str) -> Result<AnswerReport, SearchError> {
        self.pipeline(query, |_| {})
    }

    /// Answers `query`, printing progress and the final report to stdout.
    pub fn run(&self, query: &str) -> Result<AnswerReport, SearchError> {
        let report = self.pipeline(query, |stage| match stage {
            Stage::Searching => println!("Searching for: {query}"),
            Stage::Generating => println!("Generating response..."),
        })?;

        println!();
        println!("{report}");

        Ok(report)
    }

    fn pipeline<F>(&self, query: &str, mut on_stage: F) -> Result<AnswerReport, SearchError>
    where
        F: FnMut(Stage),
    {
        info!(query, num_results = self.num_results, "searching");
        on_stage(Stage::Searching);
        let sources = self.search_web(query, self.num_results)?;
        let context = assemble_context(&sources);

        info!(model = %self.model, sources = sources.len(), "generating response");
        on_stage(Stage::Generating);
        let answer = self.generate_response(query, &context);

        Ok(AnswerReport::new(query, sources, answer))
    }
}

/// Pipeline progress markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Searching,
    Generating,
}
