/// Web search via the SerpAPI HTTP API.
///
/// Normalizes the provider's `organic_results` into flat `SearchResult` records.
mod client;

pub use client::{
    DEFAULT_ENGINE, DEFAULT_SEARCH_URL, SearchClient, SearchClientBuilder, SearchClientTrait,
    SearchError, SearchResult, parse_organic_results,
};
