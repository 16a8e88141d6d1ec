//! Error types for wf2sql.

use thiserror::Error;

/// The main error type for translation requests.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The source text was empty or whitespace only.
    #[error("No WebFOCUS source given. Enter some code before translating")]
    EmptyInput,

    /// The external translation service failed (network, status, or payload).
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Missing credential or unusable configuration file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranslateError {
    /// Create an external service error.
    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalService(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this is an input validation failure rather than a processing one.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}

/// Result type alias for translation operations.
pub type TranslateResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranslateError::external("HTTP 429: quota exceeded");
        assert_eq!(
            err.to_string(),
            "External service error: HTTP 429: quota exceeded"
        );
    }

    #[test]
    fn test_validation_kind() {
        assert!(TranslateError::EmptyInput.is_validation());
        assert!(!TranslateError::config("missing key").is_validation());
    }
}
