//! Error types for the weekly report run
//!
//! Errors are classified by how the run reacts to them:
//! - Prerequisite: missing credentials/config, summarizer down. Fatal before collection.
//! - Degradable: a note source or mailbox that cannot be read. Logged, treated as empty.
//! - Publish: document backend failure. Logged once, Markdown fallback is used.

use std::path::PathBuf;
use thiserror::Error;

use crate::google_api::GoogleApiError;

/// Error type for the weekly report pipeline
#[derive(Debug, Error)]
pub enum ReportError {
    // Prerequisite errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Google authentication not set up: no token at {0}")]
    MissingCredentials(PathBuf),

    #[error("Summarizer unavailable: {0}")]
    SummarizerUnavailable(String),

    // Collection errors
    #[error("Google API error: {0}")]
    Google(#[from] GoogleApiError),

    #[error("Note source unavailable: {0}")]
    NoteSourceUnavailable(String),

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    // Output errors
    #[error("Publish failed ({publisher}): {message}")]
    PublishFailed {
        publisher: &'static str,
        message: String,
    },

    #[error("Git error: {0}")]
    GitError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl ReportError {
    /// Returns true if the run must abort before collecting any data.
    pub fn is_prerequisite(&self) -> bool {
        matches!(
            self,
            ReportError::ConfigurationError(_)
                | ReportError::MissingCredentials(_)
                | ReportError::SummarizerUnavailable(_)
                | ReportError::ParseError { .. }
        )
    }

    /// Returns true if the failing source should degrade to an empty result.
    pub fn is_degradable(&self) -> bool {
        match self {
            ReportError::NoteSourceUnavailable(_) | ReportError::IoError(_) => true,
            ReportError::Google(e) => !matches!(
                e,
                GoogleApiError::AuthExpired | GoogleApiError::TokenNotFound(_)
            ),
            _ => false,
        }
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ReportError::ConfigurationError(_) => {
                "Check settings.json in the config directory (--config-dir)."
            }
            ReportError::MissingCredentials(_) => {
                "Authorize Google access and place token.json in the config directory."
            }
            ReportError::SummarizerUnavailable(_) => {
                "Start Ollama with `ollama serve` and pull the configured model."
            }
            ReportError::Google(GoogleApiError::AuthExpired) => {
                "The Google token expired or was revoked. Re-authorize and replace token.json."
            }
            ReportError::Google(_) => "Check your internet connection and try again.",
            ReportError::NoteSourceUnavailable(_) => {
                "Verify the notes backend settings (path, folder id or cache path)."
            }
            ReportError::ParseError { .. } => "Check the file is valid JSON.",
            ReportError::PublishFailed { .. } => "The Markdown report is written as a fallback.",
            ReportError::GitError(_) => "Commit the config directory manually.",
            ReportError::IoError(_) => "Check file permissions and disk space.",
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::ConfigurationError(format!("Invalid JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_is_prerequisite() {
        let err = ReportError::MissingCredentials(PathBuf::from("/tmp/token.json"));
        assert!(err.is_prerequisite());
        assert!(!err.is_degradable());
        assert!(err.to_string().contains("/tmp/token.json"));
    }

    #[test]
    fn test_note_source_unavailable_degrades() {
        let err = ReportError::NoteSourceUnavailable("folder missing".into());
        assert!(err.is_degradable());
        assert!(!err.is_prerequisite());
    }

    #[test]
    fn test_auth_expired_does_not_degrade() {
        let err = ReportError::from(GoogleApiError::AuthExpired);
        assert!(!err.is_degradable());
        assert!(err.recovery_suggestion().contains("Re-authorize"));
    }

    #[test]
    fn test_api_error_degrades() {
        let err = ReportError::from(GoogleApiError::ApiError {
            status: 500,
            message: "backend".into(),
        });
        assert!(err.is_degradable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ReportError = io.into();
        assert!(matches!(err, ReportError::IoError(ref m) if m.contains("gone")));
    }

    #[test]
    fn test_json_error_is_configuration_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ReportError::from(json_err);
        assert!(matches!(err, ReportError::ConfigurationError(ref m) if m.starts_with("Invalid JSON")));
        assert!(err.is_prerequisite());
    }
}
