//! SerpAPI HTTP client implementation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Default SerpAPI search endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://serpapi.com/search";

/// Default search engine identifier sent with every request.
pub const DEFAULT_ENGINE: &str = "google";

/// Errors that can occur when querying the search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network-related errors (connection failures, DNS resolution, timeouts)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Response body was not valid JSON
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Error reported by the provider in its response body
    #[error("Search API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No API key was supplied to the builder
    #[error("Missing search API key")]
    MissingApiKey,
}

/// One normalized web search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }

    /// Builds a result from one `organic_results` entry.
    ///
    /// Missing or non-string fields become empty strings.
    fn from_organic(entry: &Value) -> Self {
        let field = |name: &str| {
            entry
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            title: field("title"),
            url: field("link"),
            snippet: field("snippet"),
        }
    }
}

/// Extracts at most `num_results` results from a provider response.
///
/// A response without an `organic_results` list yields no results.
pub fn parse_organic_results(response: &Value, num_results: usize) -> Vec<SearchResult> {
    response
        .get("organic_results")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .take(num_results)
                .map(SearchResult::from_organic)
                .collect()
        })
        .unwrap_or_default()
}

/// Trait for web search operations.
///
/// Lets the answering pipeline run against a stub in tests.
pub trait SearchClientTrait: Send + Sync {
    /// Returns up to `num_results` results for `query`, in provider relevance order.
    fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, SearchError>;
}

/// Builder for constructing `SearchClient` instances.
///
/// # Examples
///
/// ```
/// use askweb::search::SearchClientBuilder;
///
/// let client = SearchClientBuilder::new()
///     .api_key("secret")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.engine(), "google");
/// ```
#[derive(Debug, Default)]
pub struct SearchClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    engine: Option<String>,
    timeout: Option<Duration>,
}

impl SearchClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider API key. Required.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the search endpoint (defaults to [`DEFAULT_SEARCH_URL`]).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Overrides the engine identifier (defaults to [`DEFAULT_ENGINE`]).
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Sets a total request timeout. Requests wait indefinitely when unset.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// Fails with `MissingApiKey` when no non-blank key was given, without
    /// touching the network.
    pub fn build(self) -> Result<SearchClient, SearchError> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(SearchError::MissingApiKey)?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string());
        let endpoint = reqwest::Url::parse(&base_url)
            .map_err(|e| SearchError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(SearchError::Network)?;

        Ok(SearchClient {
            client,
            endpoint,
            api_key,
            engine: self.engine.unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
        })
    }
}

/// Synchronous SerpAPI client.
pub struct SearchClient {
    client: reqwest::blocking::Client,
    endpoint: reqwest::Url,
    api_key: String,
    engine: String,
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl SearchClient {
    /// Returns the search endpoint.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Returns the engine identifier sent with each request.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    fn search_internal(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let num = num_results.to_string();
        debug!(endpoint = %self.endpoint, engine = %self.engine, query, num_results, "sending search request");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
                ("engine", self.engine.as_str()),
            ])
            .send()
            .map_err(SearchError::Network)?;

        let status = response.status();
        let body = response.text().map_err(SearchError::Network)?;

        if !status.is_success() {
            // SerpAPI explains rejected requests as {"error": "..."}
            let message = serde_json::from_str::<Value>(&body).ok().and_then(|json| {
                json.get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });
            return Err(match message {
                Some(message) => SearchError::Api { message },
                None => SearchError::Http {
                    status: status.as_u16(),
                },
            });
        }

        let json: Value = serde_json::from_str(&body).map_err(SearchError::Serialization)?;
        let results = parse_organic_results(&json, num_results);
        debug!(count = results.len(), "search returned results");

        Ok(results)
    }
}

impl SearchClientTrait for SearchClient {
    fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        self.search_internal(query, num_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn client_for(server: &ServerGuard) -> SearchClient {
        SearchClientBuilder::new()
            .api_key("test-key")
            .base_url(format!("{}/search", server.url()))
            .build()
            .unwrap()
    }

    #[test]
    fn parse_truncates_to_requested_count_in_order() {
        let response = json!({
            "organic_results": [
                {"title": "One", "link": "http://1", "snippet": "first"},
                {"title": "Two", "link": "http://2", "snippet": "second"},
                {"title": "Three", "link": "http://3", "snippet": "third"},
                {"title": "Four", "link": "http://4", "snippet": "fourth"}
            ]
        });

        let results = parse_organic_results(&response, 3);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], SearchResult::new("One", "http://1", "first"));
        assert_eq!(results[2].title, "Three");
    }

    #[test]
    fn parse_returns_all_when_fewer_than_requested() {
        let response = json!({
            "organic_results": [{"title": "Only", "link": "http://only", "snippet": "s"}]
        });

        assert_eq!(parse_organic_results(&response, 5).len(), 1);
    }

    #[test]
    fn parse_defaults_missing_fields_to_empty() {
        let response = json!({
            "organic_results": [
                {"title": "No link"},
                {"link": "http://x", "snippet": 42},
                "not an object"
            ]
        });

        let results = parse_organic_results(&response, 3);

        assert_eq!(results[0], SearchResult::new("No link", "", ""));
        assert_eq!(results[1], SearchResult::new("", "http://x", ""));
        assert_eq!(results[2], SearchResult::default());
    }

    #[test]
    fn parse_without_organic_results_is_empty() {
        assert!(parse_organic_results(&json!({"search_metadata": {}}), 3).is_empty());
        assert!(parse_organic_results(&json!({"organic_results": "nope"}), 3).is_empty());
        assert!(parse_organic_results(&json!([1, 2, 3]), 3).is_empty());
    }

    #[test]
    fn parse_with_zero_requested_is_empty() {
        let response = json!({"organic_results": [{"title": "A"}]});
        assert!(parse_organic_results(&response, 0).is_empty());
    }

    #[test]
    fn build_without_api_key_fails() {
        let result = SearchClientBuilder::new().build();
        assert!(matches!(result, Err(SearchError::MissingApiKey)));

        let result = SearchClientBuilder::new().api_key("   ").build();
        assert!(matches!(result, Err(SearchError::MissingApiKey)));
    }

    #[test]
    fn build_rejects_invalid_url() {
        let result = SearchClientBuilder::new()
            .api_key("k")
            .base_url("not a url")
            .build();
        assert!(matches!(result, Err(SearchError::InvalidUrl(_))));
    }

    #[test]
    fn build_uses_defaults() {
        let client = SearchClientBuilder::new().api_key("k").build().unwrap();
        assert_eq!(client.endpoint(), DEFAULT_SEARCH_URL);
        assert_eq!(client.engine(), DEFAULT_ENGINE);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = SearchClientBuilder::new().api_key("super-secret").build().unwrap();
        assert!(!format!("{:?}", client).contains("super-secret"));
    }

    #[test]
    fn search_sends_expected_query_parameters() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "What is quantum computing?".into()),
                Matcher::UrlEncoded("num".into(), "3".into()),
                Matcher::UrlEncoded("api_key".into(), "test-key".into()),
                Matcher::UrlEncoded("engine".into(), "google".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "organic_results": [
                        {"title": "Quantum 101", "link": "http://x", "snippet": "basics"}
                    ]
                })
                .to_string(),
            )
            .create();

        let results = client_for(&server)
            .search("What is quantum computing?", 3)
            .unwrap();

        assert_eq!(results, vec![SearchResult::new("Quantum 101", "http://x", "basics")]);
        mock.assert();
    }

    #[test]
    fn search_surfaces_provider_error_message() {
        let mut server = Server::new();
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error":"Invalid API key."}"#)
            .create();

        match client_for(&server).search("q", 3) {
            Err(SearchError::Api { message }) => assert_eq!(message, "Invalid API key."),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn search_reports_http_status_without_error_body() {
        let mut server = Server::new();
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .create();

        let result = client_for(&server).search("q", 3);
        assert!(matches!(result, Err(SearchError::Http { status: 503 })));
    }

    #[test]
    fn search_fails_on_non_json_body() {
        let mut server = Server::new();
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>busy</html>")
            .create();

        let result = client_for(&server).search("q", 3);
        assert!(matches!(result, Err(SearchError::Serialization(_))));
    }

    #[test]
    fn search_fails_when_provider_unreachable() {
        let client = SearchClientBuilder::new()
            .api_key("k")
            .base_url("http://127.0.0.1:9/search")
            .build()
            .unwrap();

        assert!(matches!(client.search("q", 3), Err(SearchError::Network(_))));
    }
}
