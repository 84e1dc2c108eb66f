//! Summarization of per-entity context into report text.
//!
//! The pipeline only sees the [`Summarizer`] trait. Failures come back as an
//! `Error:`-prefixed string so one bad entity never aborts the run.

pub mod ollama;
pub mod prompts;

use crate::types::EntityClass;

pub use ollama::OllamaClient;
pub use prompts::build_synthesis_prompt;

/// Prefix marking a failed synthesis.
pub const ERROR_PREFIX: &str = "Error:";

/// Turns one entity's context into report text.
pub trait Summarizer {
    /// Summary text, or an [`ERROR_PREFIX`]ed message on failure.
    fn synthesize(&self, context: &str, entity_name: &str, class: EntityClass) -> String;
}

/// True if a summary is a failure marker rather than content.
pub fn is_error_summary(summary: &str) -> bool {
    summary.trim_start().starts_with(ERROR_PREFIX)
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("Ollama is not running at {0}. Start it with `ollama serve` (install from https://ollama.ai)")]
    NotRunning(String),
    #[error("Ollama is running but no models are available")]
    NoModels,
    #[error("Model '{model}' is not available (available: {}). Install it with `ollama pull {model}`", available.join(", "))]
    ModelMissing {
        model: String,
        available: Vec<String>,
    },
    #[error("Ollama returned status {0}")]
    Status(u16),
    #[error("Ollama request timed out")]
    Timeout,
    #[error("Could not connect to Ollama - {0}")]
    Connection(String),
    #[error("Unexpected Ollama response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_error_summary() {
        assert!(is_error_summary("Error: Ollama request timed out"));
        assert!(is_error_summary("  Error: x"));
        assert!(!is_error_summary("Activity: no errors this week"));
        assert!(!is_error_summary(""));
    }

    #[test]
    fn test_model_missing_message() {
        let err = SummarizerError::ModelMissing {
            model: "gemma2:27b".into(),
            available: vec!["llama3:8b".into(), "mistral:7b".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("llama3:8b, mistral:7b"));
        assert!(msg.contains("ollama pull gemma2:27b"));
    }
}
