//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{classifier, endpoints, entities, normalizer};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Strict environments refuse pattern tables with warnings
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub entities: EntityConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Pattern table override (YAML, JSON or TOML); embedded table when unset
    #[serde(default)]
    pub patterns_path: Option<String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_normalizer()?;
        self.validate_classifier()?;
        self.validate_entities()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "Port cannot be 0"));
        }
        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "server.timeout_seconds",
                "Timeout must be at least 1 second",
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.max_body_bytes",
                "Body limit must be positive",
            ));
        }
        Ok(())
    }

    fn validate_normalizer(&self) -> Result<(), ConfigError> {
        if self.normalizer.max_chars < normalizer::MIN_MAX_CHARS {
            return Err(ConfigError::invalid(
                "normalizer.max_chars",
                format!(
                    "Must be at least {}, got {}",
                    normalizer::MIN_MAX_CHARS,
                    self.normalizer.max_chars
                ),
            ));
        }
        Ok(())
    }

    fn validate_classifier(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;

        for (field, value) in [
            ("classifier.confidence_threshold", c.confidence_threshold),
            ("classifier.high_confidence", c.high_confidence),
            ("classifier.single_rule_penalty", c.single_rule_penalty),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(
                    field,
                    format!("Must be between 0.0 and 1.0, got {}", value),
                ));
            }
        }

        for (field, value) in [
            ("classifier.score_floor", c.score_floor),
            ("classifier.ambiguity_delta", c.ambiguity_delta),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("Must be a finite non-negative number, got {}", value),
                ));
            }
        }

        if !c.saturation.is_finite() || c.saturation <= 0.0 {
            return Err(ConfigError::invalid(
                "classifier.saturation",
                format!("Must be positive, got {}", c.saturation),
            ));
        }

        if c.repeat_cap == 0 {
            return Err(ConfigError::invalid(
                "classifier.repeat_cap",
                "Must be at least 1",
            ));
        }

        if c.confidence_threshold > c.high_confidence {
            return Err(ConfigError::invalid(
                "classifier.confidence_threshold",
                "Cannot exceed classifier.high_confidence",
            ));
        }

        Ok(())
    }

    fn validate_entities(&self) -> Result<(), ConfigError> {
        if self.entities.max_per_kind == 0 {
            return Err(ConfigError::invalid(
                "entities.max_per_kind",
                "Must be at least 1",
            ));
        }
        if self.entities.max_value_chars == 0 {
            return Err(ConfigError::invalid(
                "entities.max_value_chars",
                "Must be at least 1",
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins (any origin when empty)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    endpoints::DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    endpoints::DEFAULT_PORT
}
fn default_timeout() -> u64 {
    endpoints::DEFAULT_TIMEOUT_SECONDS
}
fn default_max_body_bytes() -> usize {
    endpoints::DEFAULT_MAX_BODY_BYTES
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Normalizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Output cap in chars
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    normalizer::DEFAULT_MAX_CHARS
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

/// Classifier calibration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_score_floor")]
    pub score_floor: f64,

    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    #[serde(default = "default_ambiguity_delta")]
    pub ambiguity_delta: f64,

    #[serde(default = "default_repeat_cap")]
    pub repeat_cap: usize,

    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,

    #[serde(default = "default_saturation")]
    pub saturation: f64,

    #[serde(default = "default_single_rule_penalty")]
    pub single_rule_penalty: f64,
}

fn default_score_floor() -> f64 {
    classifier::SCORE_FLOOR
}
fn default_confidence_threshold() -> f64 {
    classifier::CONFIDENCE_THRESHOLD
}
fn default_ambiguity_delta() -> f64 {
    classifier::AMBIGUITY_DELTA
}
fn default_repeat_cap() -> usize {
    classifier::REPEAT_CAP
}
fn default_high_confidence() -> f64 {
    classifier::HIGH_CONFIDENCE
}
fn default_saturation() -> f64 {
    classifier::SATURATION
}
fn default_single_rule_penalty() -> f64 {
    classifier::SINGLE_RULE_PENALTY
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            score_floor: default_score_floor(),
            confidence_threshold: default_confidence_threshold(),
            ambiguity_delta: default_ambiguity_delta(),
            repeat_cap: default_repeat_cap(),
            high_confidence: default_high_confidence(),
            saturation: default_saturation(),
            single_rule_penalty: default_single_rule_penalty(),
        }
    }
}

/// Entity extraction bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Flooding cap, per entity kind
    #[serde(default = "default_max_per_kind")]
    pub max_per_kind: usize,

    /// Values longer than this are discarded
    #[serde(default = "default_max_value_chars")]
    pub max_value_chars: usize,
}

fn default_max_per_kind() -> usize {
    entities::MAX_PER_KIND
}
fn default_max_value_chars() -> usize {
    entities::MAX_VALUE_CHARS
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            max_per_kind: default_max_per_kind(),
            max_value_chars: default_max_value_chars(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics on /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("ORDER_NLU")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
