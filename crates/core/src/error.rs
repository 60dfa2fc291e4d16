//! Error types for the NLU engine

use thiserror::Error;

/// Engine errors
///
/// The taxonomy is deliberately narrow: malformed message content is never an
/// error, only an empty message or a broken pattern table is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller violated an input precondition (empty text)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pattern table or settings are malformed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the caller can fix this by changing its request
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
