//! Types produced by the answering pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::search::SearchResult;

/// Prefix placed before the failure details when generation fails.
pub const GENERATION_ERROR_PREFIX: &str = "Error generating response: ";

/// Outcome of asking the model for an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// The model's reply, verbatim.
    Answer(String),
    /// Description of why the model could not answer.
    Failed(String),
}

impl Generation {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Folds both outcomes into the text placed in a report's answer field.
    pub fn into_text(self) -> String {
        match self {
            Self::Answer(text) => text,
            Self::Failed(details) => format!("{GENERATION_ERROR_PREFIX}{details}"),
        }
    }
}

/// Final result of answering one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReport {
    query: String,
    sources: Vec<SearchResult>,
    answer: String,
}

impl AnswerReport {
    pub fn new(query: impl Into<String>, sources: Vec<SearchResult>, answer: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            sources,
            answer: answer.into(),
        }
    }

    /// Returns the original query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the search results used as context, in relevance order.
    pub fn sources(&self) -> &[SearchResult] {
        &self.sources
    }

    /// Returns the answer text (or the generation error text).
    pub fn answer(&self) -> &str {
        &self.answer
    }
}

impl fmt::Display for AnswerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Response:")?;
        writeln!(f, "Query: {}", self.query)?;
        writeln!(f)?;
        writeln!(f, "Answer: {}", self.answer)?;
        writeln!(f)?;
        write!(f, "Sources:")?;
        for source in &self.sources {
            write!(f, "\n  - {}: {}", source.title, source.url)?;
        }
        Ok(())
    }
}
