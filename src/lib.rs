pub mod answerer;
pub mod config;
pub mod doctor;
pub mod ollama;
pub mod search;

pub use answerer::{AnswerReport, Generation, QueryAnswerer, QueryAnswererBuilder, assemble_context};
pub use config::{Config, ConfigError};
pub use ollama::{ChatMessage, OllamaClient, OllamaClientBuilder, OllamaClientTrait, OllamaError};
pub use search::{SearchClient, SearchClientBuilder, SearchClientTrait, SearchError, SearchResult};
