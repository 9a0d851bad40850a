//! Web-grounded question answering.
//!
//! This module provides the `QueryAnswerer` struct which searches the web for a
//! query, folds the result snippets into a context block and asks an
//! Ollama-hosted model to answer from that context.

mod query_answerer;
mod types;

pub use query_answerer::{QueryAnswerer, QueryAnswererBuilder, assemble_context, build_prompt};
pub use types::{AnswerReport, GENERATION_ERROR_PREFIX, Generation};
