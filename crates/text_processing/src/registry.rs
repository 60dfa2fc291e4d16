//! Compiled pattern registry
//!
//! Built once from a validated [`PatternsConfig`] and shared read-only by the
//! classifier, the extractor and the normalizer's slang table. Every regex is
//! compiled up front; a table that does not compile is rejected as a whole.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use order_nlu_config::{
    ConfigError, EntityRuleDef, PatternsConfig, RuleDef, TriggerDef, ValueFormat, ValueSource,
};
use order_nlu_core::{EntityKind, Intent};
use regex::Regex;

use crate::normalize::SlangTable;

static SHARED: OnceCell<Arc<PatternRegistry>> = OnceCell::new();

/// Compiled trigger
#[derive(Debug, Clone)]
pub enum CompiledTrigger {
    Single(Regex),
    /// Every token must occur; the rule fires as often as the rarest one
    AllOf(Vec<Regex>),
}

/// One weighted intent trigger
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub intent: Intent,
    pub weight: f64,
    pub requires_word_boundary: bool,
    /// Trigger as written in the table, for logs
    pub source: String,
    trigger: CompiledTrigger,
}

impl PatternRule {
    pub fn trigger(&self) -> &CompiledTrigger {
        &self.trigger
    }

    /// Non-overlapping occurrences in `text`, capped at `cap`
    pub fn count_matches(&self, text: &str, cap: usize) -> usize {
        match &self.trigger {
            CompiledTrigger::Single(regex) => regex.find_iter(text).take(cap).count(),
            CompiledTrigger::AllOf(regexes) => regexes
                .iter()
                .map(|regex| regex.find_iter(text).take(cap).count())
                .min()
                .unwrap_or(0),
        }
    }
}

/// Compiled entity extraction rule
#[derive(Debug, Clone)]
pub struct EntityRule {
    pub name: String,
    pub kind: EntityKind,
    pub regex: Regex,
    pub group: usize,
    pub format: ValueFormat,
    pub bare_number: bool,
    pub source: ValueSource,
}

/// Catalog product with a single matcher over all its spellings
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: String,
    pub regex: Regex,
}

/// Read-only, compiled pattern table
#[derive(Debug)]
pub struct PatternRegistry {
    version: String,
    rules: HashMap<Intent, Vec<PatternRule>>,
    entity_rules: Vec<EntityRule>,
    catalog: Vec<CatalogEntry>,
    slang: Arc<SlangTable>,
}

impl PatternRegistry {
    /// Validate and compile a pattern table
    pub fn from_config(config: &PatternsConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rules: HashMap<Intent, Vec<PatternRule>> = HashMap::new();
        for block in &config.intents {
            let compiled = block
                .rules
                .iter()
                .enumerate()
                .map(|(idx, rule)| compile_rule(block.intent, idx, rule))
                .collect::<Result<Vec<_>, _>>()?;
            rules.entry(block.intent).or_default().extend(compiled);
        }

        let entity_rules = config
            .entities
            .iter()
            .map(compile_entity_rule)
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = config
            .catalog
            .iter()
            .map(|product| {
                let mut spellings: Vec<&str> = product.spellings().collect();
                spellings.sort_by_key(|s| std::cmp::Reverse(s.len()));
                let alternation = spellings
                    .iter()
                    .map(|s| regex::escape(s))
                    .collect::<Vec<_>>()
                    .join("|");
                let regex = compile(&format!(r"\b(?:{})\b", alternation), || {
                    format!("catalog.{}", product.name)
                })?;
                Ok(CatalogEntry {
                    name: product.name.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let registry = Self {
            version: config.version.clone(),
            rules,
            entity_rules,
            catalog,
            slang: Arc::new(SlangTable::from_defs(&config.slang)),
        };

        tracing::info!(
            version = %registry.version,
            intent_rules = registry.rule_count(),
            entity_rules = registry.entity_rules.len(),
            products = registry.catalog.len(),
            slang = registry.slang.len(),
            "Pattern registry compiled"
        );

        Ok(registry)
    }

    /// Registry over the embedded table
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_config(&PatternsConfig::builtin()?)
    }

    /// Process-wide registry over the embedded table, compiled on first use
    pub fn shared() -> Result<Arc<Self>, ConfigError> {
        SHARED
            .get_or_try_init(|| Self::builtin().map(Arc::new))
            .cloned()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules_for(&self, intent: Intent) -> &[PatternRule] {
        self.rules.get(&intent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Entity rules in application order
    pub fn all_entity_rules(&self) -> &[EntityRule] {
        &self.entity_rules
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    pub fn slang(&self) -> Arc<SlangTable> {
        Arc::clone(&self.slang)
    }
}

fn compile(source: &str, rule: impl FnOnce() -> String) -> Result<Regex, ConfigError> {
    Regex::new(source).map_err(|e| ConfigError::Pattern {
        rule: rule(),
        message: e.to_string(),
    })
}

fn bounded(source: &str, word_boundary: bool) -> String {
    if word_boundary {
        format!(r"\b(?:{})\b", source)
    } else {
        source.to_string()
    }
}

fn compile_rule(intent: Intent, idx: usize, rule: &RuleDef) -> Result<PatternRule, ConfigError> {
    let name = || format!("intents.{}[{}]", intent, idx);
    let wb = rule.word_boundary;

    let trigger = match rule.trigger() {
        Some(TriggerDef::Literal(text)) => {
            CompiledTrigger::Single(compile(&bounded(&regex::escape(text), wb), name)?)
        }
        Some(TriggerDef::Pattern(pattern)) => {
            CompiledTrigger::Single(compile(&bounded(pattern, wb), name)?)
        }
        Some(TriggerDef::AllOf(tokens)) => CompiledTrigger::AllOf(
            tokens
                .iter()
                .map(|token| compile(&bounded(&regex::escape(token), wb), name))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        None => {
            return Err(ConfigError::Pattern {
                rule: name(),
                message: "exactly one of literal, all_of or pattern is required".to_string(),
            })
        }
    };

    Ok(PatternRule {
        intent,
        weight: rule.weight,
        requires_word_boundary: wb,
        source: rule.describe(),
        trigger,
    })
}

fn compile_entity_rule(def: &EntityRuleDef) -> Result<EntityRule, ConfigError> {
    let name = || format!("entities.{}", def.name);
    let regex = compile(&def.pattern, name)?;

    if def.group >= regex.captures_len() {
        return Err(ConfigError::Pattern {
            rule: name(),
            message: format!(
                "capture group {} does not exist ({} groups)",
                def.group,
                regex.captures_len() - 1
            ),
        });
    }

    Ok(EntityRule {
        name: def.name.clone(),
        kind: def.kind,
        regex,
        group: def.group,
        format: def.format,
        bare_number: def.bare_number,
        source: def.source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_nlu_config::IntentPatterns;

    #[test]
    fn test_builtin_registry_compiles() {
        let registry = PatternRegistry::builtin().unwrap();
        for intent in Intent::SCORED {
            assert!(!registry.rules_for(intent).is_empty());
        }
        assert!(registry.rules_for(Intent::IntencionDesconocida).is_empty());
        assert!(!registry.all_entity_rules().is_empty());
        assert!(!registry.catalog().is_empty());
        assert!(!registry.slang().is_empty());
    }

    #[test]
    fn test_shared_is_cached() {
        let a = PatternRegistry::shared().unwrap();
        let b = PatternRegistry::shared().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_literal_respects_word_boundary() {
        let rule = compile_rule(Intent::TrackearPedido, 0, &RuleDef::literal("pedido", 1.0)).unwrap();
        assert_eq!(rule.count_matches("mi pedido", 2), 1);
        assert_eq!(rule.count_matches("pedidos", 2), 0);
        assert_eq!(rule.count_matches("pedido pedido pedido", 2), 2);
    }

    #[test]
    fn test_all_of_counts_rarest_token() {
        let rule = compile_rule(
            Intent::TrackearPedido,
            0,
            &RuleDef::all_of(&["numero", "seguimiento"], 1.0),
        )
        .unwrap();
        assert_eq!(rule.count_matches("numero de seguimiento", 2), 1);
        assert_eq!(rule.count_matches("seguimiento sin el otro", 2), 0);
    }

    #[test]
    fn test_literal_is_escaped() {
        let rule = compile_rule(Intent::ConsultarPrecio, 0, &RuleDef::literal("a.b", 1.0)).unwrap();
        assert_eq!(rule.count_matches("axb", 2), 0);
        assert_eq!(rule.count_matches("a.b", 2), 1);
    }

    #[test]
    fn test_bad_regex_is_rejected() {
        let mut config = PatternsConfig::builtin().unwrap();
        config.intents.push(IntentPatterns {
            intent: Intent::Saludo,
            rules: vec![RuleDef::pattern("(unclosed", 1.0)],
        });
        // duplicate intent blocks are caught by validation before compiling
        assert!(PatternRegistry::from_config(&config).is_err());

        let mut config = PatternsConfig::builtin().unwrap();
        config.intents[0].rules.push(RuleDef::pattern("(unclosed", 1.0));
        let err = PatternRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }), "{:?}", err);
    }

    #[test]
    fn test_missing_capture_group_is_rejected() {
        let mut config = PatternsConfig::builtin().unwrap();
        config.entities[0].group = 5;
        let err = PatternRegistry::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("capture group 5"));
    }

    #[test]
    fn test_catalog_prefers_longest_spelling() {
        let registry = PatternRegistry::builtin().unwrap();
        let zapatillas = registry
            .catalog()
            .iter()
            .find(|entry| entry.name == "zapatillas")
            .unwrap();
        let m = zapatillas.regex.find("tienen zapatillas rojas").unwrap();
        assert_eq!(m.as_str(), "zapatillas");
        assert!(zapatillas.regex.find("zapallo").is_none());
    }
}
