//! Error types for the text processing crate

use order_nlu_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NluError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] order_nlu_core::Error),
}

impl NluError {
    /// Whether the caller can fix this by changing its request
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::Core(err) => err.is_validation(),
            Self::Config(_) => false,
        }
    }
}

impl From<NluError> for order_nlu_core::Error {
    fn from(err: NluError) -> Self {
        match err {
            NluError::Validation(message) => order_nlu_core::Error::Validation(message),
            NluError::Config(err) => err.into(),
            NluError::Core(err) => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, NluError>;
