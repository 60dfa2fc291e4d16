//! Pattern table validator
//!
//! Validates the pattern table at startup so a broken table stops the process
//! instead of silently misclassifying. Performs:
//! - Coverage check (every scored intent has rules, nothing targets unknown)
//! - Value range validation (weights)
//! - Schema checks (exactly one trigger per rule, non-empty patterns)
//! - Slang table closure (substitution stays idempotent and bounded)
//!
//! # Example
//!
//! ```ignore
//! use order_nlu_config::{PatternValidator, PatternsConfig};
//!
//! let config = PatternsConfig::load("config/patterns.yaml")?;
//! let result = PatternValidator::new().validate("patterns.yaml", &config);
//! println!("{}", result.summary());
//! ```

use order_nlu_core::Intent;
use std::collections::HashSet;

use crate::constants::{normalizer::MAX_SLANG_TOKEN_CHARS, patterns::MAX_SLANG_EXPANSION};
use crate::patterns::{PatternsConfig, TriggerDef};

/// Validation issue with context
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub category: ValidationCategory,
    /// Table section (intents, entities, catalog, slang)
    pub section: String,
    /// Specific entry
    pub field: Option<String>,
    pub message: String,
    pub severity: ValidationSeverity,
}

impl ValidationIssue {
    /// `section.field` path of the offending entry
    pub fn location(&self) -> String {
        match &self.field {
            Some(field) => format!("{}.{}", self.section, field),
            None => self.section.clone(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.location(), self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCategory {
    MissingRequired,
    InvalidReference,
    ValueOutOfRange,
    Duplicate,
    SchemaMismatch,
    /// Entry can never take effect
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Warning,
    Error,
    /// Will prevent startup
    Critical,
}

/// Validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
    /// Table being validated
    pub source: String,
}

impl ValidationResult {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            issues: Vec::new(),
            source: source.into(),
        }
    }

    fn push(
        &mut self,
        severity: ValidationSeverity,
        category: ValidationCategory,
        section: &str,
        field: Option<String>,
        message: impl Into<String>,
    ) {
        self.issues.push(ValidationIssue {
            category,
            section: section.to_string(),
            field,
            message: message.into(),
            severity,
        });
    }

    pub fn add_critical(
        &mut self,
        category: ValidationCategory,
        section: &str,
        field: Option<String>,
        message: impl Into<String>,
    ) {
        self.push(ValidationSeverity::Critical, category, section, field, message);
    }

    pub fn add_warning(
        &mut self,
        category: ValidationCategory,
        section: &str,
        field: Option<String>,
        message: impl Into<String>,
    ) {
        self.push(ValidationSeverity::Warning, category, section, field, message);
    }

    /// Passed when nothing at Error severity or above was found
    pub fn is_ok(&self) -> bool {
        self.blocking().is_empty()
    }

    /// Errors and critical issues (not warnings)
    pub fn blocking(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= ValidationSeverity::Error)
            .collect()
    }

    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Warning)
            .collect()
    }

    pub fn summary(&self) -> String {
        let critical = self.issues.iter().filter(|i| i.severity == ValidationSeverity::Critical).count();
        let errors = self.issues.iter().filter(|i| i.severity == ValidationSeverity::Error).count();
        let warnings = self.warnings().len();

        if self.issues.is_empty() {
            format!("Patterns '{}': All validations passed", self.source)
        } else {
            format!(
                "Patterns '{}': {} critical, {} errors, {} warnings",
                self.source, critical, errors, warnings
            )
        }
    }
}

/// Pattern table validator
pub struct PatternValidator {
    include_warnings: bool,
}

impl Default for PatternValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternValidator {
    pub fn new() -> Self {
        Self {
            include_warnings: true,
        }
    }

    pub fn with_warnings(mut self, include: bool) -> Self {
        self.include_warnings = include;
        self
    }

    pub fn validate(&self, source: &str, config: &PatternsConfig) -> ValidationResult {
        let mut result = ValidationResult::new(source);

        self.validate_intents(config, &mut result);
        self.validate_entities(config, &mut result);
        self.validate_catalog(config, &mut result);
        self.validate_slang(config, &mut result);

        if !self.include_warnings {
            result.issues.retain(|i| i.severity != ValidationSeverity::Warning);
        }

        result
    }

    fn validate_intents(&self, config: &PatternsConfig, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for block in &config.intents {
            let intent = block.intent;
            if intent == Intent::IntencionDesconocida {
                result.add_critical(
                    ValidationCategory::InvalidReference,
                    "intents",
                    Some(intent.to_string()),
                    "The unknown intent is a fallback and cannot be the target of a rule",
                );
                continue;
            }
            if !seen.insert(intent) {
                result.add_critical(
                    ValidationCategory::Duplicate,
                    "intents",
                    Some(intent.to_string()),
                    "Intent declared more than once",
                );
            }

            let mut triggers = HashSet::new();
            for (index, rule) in block.rules.iter().enumerate() {
                let field = Some(format!("{}[{}]", intent, index));

                if !rule.weight.is_finite() || rule.weight <= 0.0 {
                    result.add_critical(
                        ValidationCategory::ValueOutOfRange,
                        "intents",
                        field.clone(),
                        format!("Weight must be positive and finite, got {}", rule.weight),
                    );
                }

                let empty = match rule.trigger() {
                    None => {
                        result.add_critical(
                            ValidationCategory::SchemaMismatch,
                            "intents",
                            field.clone(),
                            "Rule must set exactly one of literal, all_of, pattern",
                        );
                        continue;
                    },
                    Some(TriggerDef::Literal(text)) => {
                        if text.to_lowercase() != text {
                            result.add_warning(
                                ValidationCategory::Unreachable,
                                "intents",
                                field.clone(),
                                format!("Literal '{}' is not lowercase and can never match", text),
                            );
                        }
                        text.trim().is_empty()
                    },
                    Some(TriggerDef::AllOf(tokens)) => {
                        tokens.is_empty() || tokens.iter().any(|t| t.trim().is_empty())
                    },
                    Some(TriggerDef::Pattern(regex)) => regex.trim().is_empty(),
                };

                if empty {
                    result.add_critical(
                        ValidationCategory::SchemaMismatch,
                        "intents",
                        field.clone(),
                        "Trigger is empty",
                    );
                }

                if !triggers.insert(rule.describe()) {
                    result.add_warning(
                        ValidationCategory::Duplicate,
                        "intents",
                        field,
                        format!("Duplicate trigger {}", rule.describe()),
                    );
                }
            }
        }

        for intent in Intent::SCORED {
            if config.rules_for(intent).is_empty() {
                result.add_critical(
                    ValidationCategory::MissingRequired,
                    "intents",
                    Some(intent.to_string()),
                    "Intent has no rules",
                );
            }
        }
    }

    fn validate_entities(&self, config: &PatternsConfig, result: &mut ValidationResult) {
        let mut names = HashSet::new();

        for (index, rule) in config.entities.iter().enumerate() {
            let field = Some(if rule.name.is_empty() {
                format!("[{}]", index)
            } else {
                rule.name.clone()
            });

            if rule.name.trim().is_empty() {
                result.add_critical(
                    ValidationCategory::MissingRequired,
                    "entities",
                    field.clone(),
                    "Entity rule needs a name",
                );
            }
            if rule.pattern.trim().is_empty() {
                result.add_critical(
                    ValidationCategory::SchemaMismatch,
                    "entities",
                    field.clone(),
                    "Entity rule pattern is empty",
                );
            }
            if !names.insert(rule.name.as_str()) {
                result.add_warning(
                    ValidationCategory::Duplicate,
                    "entities",
                    field,
                    "Duplicate entity rule name",
                );
            }
        }
    }

    fn validate_catalog(&self, config: &PatternsConfig, result: &mut ValidationResult) {
        if config.catalog.is_empty() {
            result.add_warning(
                ValidationCategory::Unreachable,
                "catalog",
                None,
                "Catalog is empty, products are only found by cue",
            );
        }

        for product in &config.catalog {
            if product.spellings().any(|s| s.trim().is_empty()) {
                result.add_critical(
                    ValidationCategory::SchemaMismatch,
                    "catalog",
                    Some(product.name.clone()),
                    "Product name and aliases must be non-empty",
                );
            }
        }
    }

    /// The normalizer applies slang once per call and must stay idempotent,
    /// so no replacement may produce text that another entry would rewrite.
    fn validate_slang(&self, config: &PatternsConfig, result: &mut ValidationResult) {
        let mut keys = HashSet::new();
        let mut single_keys = HashSet::new();
        let mut multi_key_words = HashSet::new();

        for entry in &config.slang {
            let field = Some(entry.from.clone());
            let tokens: Vec<&str> = entry.from.split_whitespace().collect();

            let well_formed = !tokens.is_empty()
                && tokens.join(" ") == entry.from
                && tokens.iter().all(|t| {
                    t.chars().count() <= MAX_SLANG_TOKEN_CHARS
                        && t.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                });
            if !well_formed {
                result.add_critical(
                    ValidationCategory::SchemaMismatch,
                    "slang",
                    field.clone(),
                    "Key must be short lowercase ASCII tokens separated by single spaces",
                );
            }

            let output_ok = !entry.to.is_empty()
                && entry.to.split(' ').all(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_lowercase()))
                && !has_letter_run(&entry.to, 3);
            if !output_ok {
                result.add_critical(
                    ValidationCategory::SchemaMismatch,
                    "slang",
                    field.clone(),
                    format!("Replacement '{}' must be plain lowercase words", entry.to),
                );
            }

            if entry.to.chars().count() > MAX_SLANG_EXPANSION * entry.from.chars().count().max(1) {
                result.add_critical(
                    ValidationCategory::ValueOutOfRange,
                    "slang",
                    field.clone(),
                    format!("Replacement grows the token more than {}x", MAX_SLANG_EXPANSION),
                );
            }

            if !keys.insert(entry.from.as_str()) {
                result.add_critical(
                    ValidationCategory::Duplicate,
                    "slang",
                    field,
                    "Duplicate slang key",
                );
            }

            if tokens.len() == 1 {
                single_keys.insert(tokens[0]);
            } else {
                multi_key_words.extend(tokens.iter().copied());
            }
        }

        for entry in &config.slang {
            for word in entry.to.split(' ') {
                if single_keys.contains(word) || multi_key_words.contains(word) {
                    result.add_critical(
                        ValidationCategory::InvalidReference,
                        "slang",
                        Some(entry.from.clone()),
                        format!("Replacement word '{}' is itself a slang key", word),
                    );
                }
            }
        }
    }
}

fn has_letter_run(text: &str, len: usize) -> bool {
    let mut run = 0;
    let mut prev = None;
    for c in text.chars() {
        if Some(c) == prev && c.is_alphabetic() {
            run += 1;
        } else {
            run = 1;
        }
        if run >= len {
            return true;
        }
        prev = Some(c);
    }
    false
}
