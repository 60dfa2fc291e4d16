//! Configuration management for the NLU engine
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (ORDER_NLU_ prefix, `__` separator)
//!
//! # Pattern table
//!
//! Intent triggers, entity extraction rules, the product catalog and the
//! informal-spelling table are data, not code. The default table ships embedded
//! in the binary (`data/patterns.yaml`); `patterns_path` in the settings points
//! at an override file (YAML, JSON or TOML).

pub mod constants;
pub mod patterns;
pub mod settings;
pub mod validator;

pub use patterns::{
    EntityRuleDef, IntentPatterns, PatternsConfig, ProductDef, RuleDef, SlangDef, TriggerDef,
    ValueFormat, ValueSource,
};
pub use settings::{
    load_settings, ClassifierConfig, EntityConfig, NormalizerConfig, ObservabilityConfig,
    RuntimeEnvironment, ServerConfig, Settings,
};
pub use validator::{
    PatternValidator, ValidationCategory, ValidationIssue, ValidationResult, ValidationSeverity,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Invalid pattern in rule {rule}: {message}")]
    Pattern { rule: String, message: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::FileNotFound(err.to_string())
    }
}

impl From<ConfigError> for order_nlu_core::Error {
    fn from(err: ConfigError) -> Self {
        order_nlu_core::Error::Config(err.to_string())
    }
}
