//! Runtime configuration loaded from `.env` and the process environment.

use thiserror::Error;
use tracing::warn;

use crate::search::{DEFAULT_ENGINE, DEFAULT_SEARCH_URL};

/// Default number of search results used as context.
pub const DEFAULT_NUM_RESULTS: usize = 3;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

pub const SERPAPI_KEY_VAR: &str = "SERPAPI_KEY";
pub const SERPAPI_URL_VAR: &str = "SERPAPI_URL";
pub const SERPAPI_ENGINE_VAR: &str = "SERPAPI_ENGINE";
pub const OLLAMA_HOST_VAR: &str = "OLLAMA_HOST";
pub const OLLAMA_MODEL_VAR: &str = "OLLAMA_MODEL";
pub const NUM_RESULTS_VAR: &str = "ASKWEB_NUM_RESULTS";

/// Errors raised while assembling configuration, before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0}: set it in the environment or a .env file")]
    MissingApiKey(&'static str),

    #[error("No model configured: pass --model or set OLLAMA_MODEL")]
    MissingModel,

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid URL for {name}: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{0} must be set before building")]
    MissingComponent(&'static str),

    #[error("Failed to initialize HTTP client: {0}")]
    HttpClient(String),
}

/// Immutable settings shared by one `QueryAnswerer`.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub serpapi_key: String,
    pub search_url: String,
    pub search_engine: String,
    pub ollama_host: String,
    /// Ollama model identifier. `None` until supplied by env or CLI.
    pub model: Option<String>,
    pub num_results: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("serpapi_key", &"<redacted>")
            .field("search_url", &self.search_url)
            .field("search_engine", &self.search_engine)
            .field("ollama_host", &self.ollama_host)
            .field("model", &self.model)
            .field("num_results", &self.num_results)
            .finish()
    }
}

impl Config {
    /// Loads `.env` (if present) and reads configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            warn!(error = %e, "failed to load .env file");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let serpapi_key = get(SERPAPI_KEY_VAR).ok_or(ConfigError::MissingApiKey(SERPAPI_KEY_VAR))?;

        let num_results = match get(NUM_RESULTS_VAR) {
            Some(raw) => parse_num_results(NUM_RESULTS_VAR, &raw)?,
            None => DEFAULT_NUM_RESULTS,
        };

        let config = Self {
            serpapi_key,
            search_url: get(SERPAPI_URL_VAR).unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            search_engine: get(SERPAPI_ENGINE_VAR).unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
            ollama_host: get(OLLAMA_HOST_VAR).unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
            model: get(OLLAMA_MODEL_VAR),
            num_results,
        };
        config.validate_urls()?;

        Ok(config)
    }

    /// Returns the configured model or `MissingModel`.
    pub fn require_model(&self) -> Result<&str, ConfigError> {
        self.model.as_deref().ok_or(ConfigError::MissingModel)
    }

    fn validate_urls(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            (SERPAPI_URL_VAR, &self.search_url),
            (OLLAMA_HOST_VAR, &self.ollama_host),
        ] {
            reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
                name,
                reason: format!("{}: {}", url, e),
            })?;
        }
        Ok(())
    }
}

/// Parses a positive result count.
pub fn parse_num_results(name: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: "must be at least 1".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let result = Config::from_lookup(lookup(&[(OLLAMA_MODEL_VAR, "llama2")]));
        assert!(matches!(result, Err(ConfigError::MissingApiKey("SERPAPI_KEY"))));
    }

    #[test]
    fn blank_api_key_is_an_error() {
        let result = Config::from_lookup(lookup(&[(SERPAPI_KEY_VAR, "  ")]));
        assert!(matches!(result, Err(ConfigError::MissingApiKey(_))));
    }

    #[test]
    fn missing_api_key_message_names_variable() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("SERPAPI_KEY"));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup(&[(SERPAPI_KEY_VAR, "abc")])).unwrap();

        assert_eq!(config.serpapi_key, "abc");
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.search_engine, "google");
        assert_eq!(config.ollama_host, DEFAULT_OLLAMA_HOST);
        assert_eq!(config.model, None);
        assert_eq!(config.num_results, 3);
    }

    #[test]
    fn all_variables_are_read() {
        let config = Config::from_lookup(lookup(&[
            (SERPAPI_KEY_VAR, "abc"),
            (SERPAPI_URL_VAR, "http://search.local/search"),
            (SERPAPI_ENGINE_VAR, "bing"),
            (OLLAMA_HOST_VAR, "http://gpu-box:11434"),
            (OLLAMA_MODEL_VAR, "tinyllama:latest"),
            (NUM_RESULTS_VAR, "5"),
        ]))
        .unwrap();

        assert_eq!(config.search_url, "http://search.local/search");
        assert_eq!(config.search_engine, "bing");
        assert_eq!(config.ollama_host, "http://gpu-box:11434");
        assert_eq!(config.require_model().unwrap(), "tinyllama:latest");
        assert_eq!(config.num_results, 5);
    }

    #[test]
    fn require_model_fails_when_unset() {
        let config = Config::from_lookup(lookup(&[(SERPAPI_KEY_VAR, "abc")])).unwrap();
        assert!(matches!(config.require_model(), Err(ConfigError::MissingModel)));
    }

    #[test]
    fn zero_or_garbage_num_results_rejected() {
        for raw in ["0", "-1", "three"] {
            let result =
                Config::from_lookup(lookup(&[(SERPAPI_KEY_VAR, "abc"), (NUM_RESULTS_VAR, raw)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_host_url_rejected() {
        let result = Config::from_lookup(lookup(&[
            (SERPAPI_KEY_VAR, "abc"),
            (OLLAMA_HOST_VAR, "localhost without scheme"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidUrl { name: "OLLAMA_HOST", .. })));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = Config::from_lookup(lookup(&[(SERPAPI_KEY_VAR, "top-secret")])).unwrap();
        assert!(!format!("{:?}", config).contains("top-secret"));
    }
}
