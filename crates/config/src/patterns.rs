//! Pattern table configuration
//!
//! The table drives every data-dependent stage of the engine:
//! - `intents`: weighted trigger rules per intent
//! - `entities`: ordered entity extraction rules
//! - `catalog`: known product names and their aliases
//! - `slang`: informal spelling substitutions applied by the normalizer
//!
//! All triggers and keys are written in normalized form (lowercase, no
//! accents) because they only ever run against normalized text.

use order_nlu_core::{EntityKind, Intent};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::patterns::BUILTIN_SOURCE;
use crate::validator::{PatternValidator, ValidationResult};
use crate::ConfigError;

const BUILTIN_PATTERNS: &str = include_str!("../data/patterns.yaml");

/// Complete pattern table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternsConfig {
    /// Table version, reported by the health endpoint
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub intents: Vec<IntentPatterns>,

    #[serde(default)]
    pub entities: Vec<EntityRuleDef>,

    #[serde(default)]
    pub catalog: Vec<ProductDef>,

    #[serde(default)]
    pub slang: Vec<SlangDef>,
}

/// Trigger rules for one intent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentPatterns {
    pub intent: Intent,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

/// One weighted trigger
///
/// Exactly one of `literal`, `all_of` or `pattern` must be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleDef {
    /// Phrase matched verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,

    /// Tokens that must all be present, in any order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<String>>,

    /// Regular expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    pub weight: f64,

    #[serde(default = "default_word_boundary")]
    pub word_boundary: bool,
}

fn default_word_boundary() -> bool {
    true
}

/// Resolved trigger of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDef<'a> {
    Literal(&'a str),
    AllOf(&'a [String]),
    Pattern(&'a str),
}

impl RuleDef {
    pub fn literal(text: impl Into<String>, weight: f64) -> Self {
        Self {
            literal: Some(text.into()),
            all_of: None,
            pattern: None,
            weight,
            word_boundary: true,
        }
    }

    pub fn pattern(regex: impl Into<String>, weight: f64) -> Self {
        Self {
            literal: None,
            all_of: None,
            pattern: Some(regex.into()),
            weight,
            word_boundary: true,
        }
    }

    pub fn all_of(tokens: &[&str], weight: f64) -> Self {
        Self {
            literal: None,
            all_of: Some(tokens.iter().map(|t| t.to_string()).collect()),
            pattern: None,
            weight,
            word_boundary: true,
        }
    }

    /// The single configured trigger, if the rule is well-formed
    pub fn trigger(&self) -> Option<TriggerDef<'_>> {
        match (&self.literal, &self.all_of, &self.pattern) {
            (Some(text), None, None) => Some(TriggerDef::Literal(text)),
            (None, Some(tokens), None) => Some(TriggerDef::AllOf(tokens)),
            (None, None, Some(regex)) => Some(TriggerDef::Pattern(regex)),
            _ => None,
        }
    }

    /// Human-readable trigger, used in logs and validation messages
    pub fn describe(&self) -> String {
        match self.trigger() {
            Some(TriggerDef::Literal(text)) => format!("literal '{}'", text),
            Some(TriggerDef::AllOf(tokens)) => format!("all_of [{}]", tokens.join(", ")),
            Some(TriggerDef::Pattern(regex)) => format!("pattern /{}/", regex),
            None => "malformed trigger".to_string(),
        }
    }
}

/// How an entity match is turned into its canonical value
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Matched text as-is
    #[default]
    Raw,
    /// Uppercased identifier
    Uppercase,
    /// Canonical decimal number
    Price,
}

/// Which text an entity value is read from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// The normalized match
    #[default]
    Normalized,
    /// The customer's own spelling of the matched span
    Original,
}

/// One entity extraction rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityRuleDef {
    pub name: String,
    pub kind: EntityKind,
    pub pattern: String,
    /// Capture group holding the value (0 = whole match)
    #[serde(default)]
    pub group: usize,
    #[serde(default)]
    pub format: ValueFormat,
    /// Bare number with no lexical cue; its kind follows the prior intent
    #[serde(default)]
    pub bare_number: bool,
    #[serde(default)]
    pub source: ValueSource,
}

/// Catalog product with its alternative spellings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDef {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ProductDef {
    /// Name followed by aliases
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Informal spelling substitution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlangDef {
    /// Token or space-separated token sequence
    pub from: String,
    pub to: String,
}

impl SlangDef {
    pub fn token_count(&self) -> usize {
        self.from.split_whitespace().count()
    }
}

impl PatternsConfig {
    /// Embedded default table
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml_str(BUILTIN_PATTERNS)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from a file, picking the format from its extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("yaml")
            .to_ascii_lowercase();

        let config = match extension.as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?,
            "toml" => toml::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?,
            _ => serde_yaml::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?,
        };

        tracing::debug!(path = %path.display(), "Loaded pattern table");
        Ok(config)
    }

    /// Load from `path`, or the embedded table when unset
    pub fn load_or_builtin(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn rules_for(&self, intent: Intent) -> &[RuleDef] {
        self.intents
            .iter()
            .find(|block| block.intent == intent)
            .map(|block| block.rules.as_slice())
            .unwrap_or(&[])
    }

    pub fn rule_count(&self) -> usize {
        self.intents.iter().map(|block| block.rules.len()).sum()
    }

    /// Full validation report, warnings included
    pub fn validation_report(&self) -> ValidationResult {
        let source = if self.version.is_empty() {
            BUILTIN_SOURCE
        } else {
            self.version.as_str()
        };
        PatternValidator::new().validate(source, self)
    }

    /// Fail fast on the first blocking issue
    pub fn validate(&self) -> Result<(), ConfigError> {
        let report = self.validation_report();
        match report.blocking().first() {
            Some(issue) => Err(ConfigError::InvalidValue {
                field: issue.location(),
                message: issue.message.clone(),
            }),
            None => Ok(()),
        }
    }
}
