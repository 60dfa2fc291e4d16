//! Entity extraction
//!
//! Pulls order numbers, tracking ids, prices and catalog products out of
//! normalized text. Rules run in registry order and each accepted match claims
//! its span, so a later, looser rule can never relabel text an earlier rule
//! already understood (`tracking 222` is a tracking id, not an order number).
//!
//! Identifier rules read their value from the customer's own spelling of the
//! matched span, since normalization squeezes letter runs (`TRK-AAA123` would
//! otherwise become `TRK-A123`).
//!
//! Output is bounded regardless of input: values are deduplicated per kind,
//! each kind keeps at most `max_per_kind` entities and oversized values are
//! dropped.
//!
//! # Example
//!
//! ```ignore
//! let extractor = EntityExtractor::new(registry, EntityConfig::default());
//! let entities = extractor.extract(&normalizer.normalize("mi pedido 12345"), "mi pedido 12345");
//!
//! assert_eq!(entities[0].kind, EntityKind::NumeroPedido);
//! assert_eq!(entities[0].value, "12345");
//! ```

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use order_nlu_config::constants::entities::MAX_MATCHES_PER_RULE;
use order_nlu_config::{EntityConfig, ValueFormat, ValueSource};
use unicode_categories::UnicodeCategories;
use order_nlu_core::{Entity, EntityKind, Intent, Span};

use crate::normalize::NormalizedText;
use crate::registry::{EntityRule, PatternRegistry};

/// Rule-based entity extractor
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    registry: Arc<PatternRegistry>,
    config: EntityConfig,
}

/// Accumulates accepted entities and the spans they claim
struct Collector {
    max_per_kind: usize,
    claimed: Vec<Span>,
    seen: HashSet<(EntityKind, String)>,
    counts: HashMap<EntityKind, usize>,
    entities: Vec<Entity>,
}

impl Collector {
    fn new(max_per_kind: usize) -> Self {
        Self {
            max_per_kind,
            claimed: Vec::new(),
            seen: HashSet::new(),
            counts: HashMap::new(),
            entities: Vec::new(),
        }
    }

    fn is_full(&self, kind: EntityKind) -> bool {
        self.counts.get(&kind).copied().unwrap_or(0) >= self.max_per_kind
    }

    fn is_claimed(&self, span: &Span) -> bool {
        self.claimed.iter().any(|claimed| claimed.overlaps(span))
    }

    /// Claim `span`; the entity is kept unless its value was already seen
    fn accept(&mut self, kind: EntityKind, value: String, span: Span) {
        self.claimed.push(span);
        if self.seen.insert((kind, value.clone())) {
            *self.counts.entry(kind).or_insert(0) += 1;
            self.entities.push(Entity::new(kind, value, span));
        }
    }

    fn finish(mut self) -> Vec<Entity> {
        self.entities.sort_by_key(|e| (e.span.start, e.span.end));
        self.entities
    }
}

impl EntityExtractor {
    pub fn new(registry: Arc<PatternRegistry>, config: EntityConfig) -> Self {
        Self { registry, config }
    }

    pub fn extract(&self, normalized: &NormalizedText, original: &str) -> Vec<Entity> {
        self.extract_with_hint(normalized, original, None)
    }

    /// Extract with a prior intent
    ///
    /// `original` must be the text `normalized` was produced from. The hint
    /// only decides what a bare number is: a product code in stock
    /// and price conversations, an order number otherwise.
    pub fn extract_with_hint(
        &self,
        normalized: &NormalizedText,
        original: &str,
        hint: Option<Intent>,
    ) -> Vec<Entity> {
        let text = normalized.as_str();
        if text.is_empty() {
            return Vec::new();
        }

        let mut collector = Collector::new(self.config.max_per_kind);

        for rule in self.registry.all_entity_rules() {
            let kind = if rule.bare_number {
                bare_number_kind(hint, rule.kind)
            } else {
                rule.kind
            };
            self.apply_rule(rule, kind, normalized, original, &mut collector);
        }

        'catalog: for product in self.registry.catalog() {
            for m in product.regex.find_iter(text).take(MAX_MATCHES_PER_RULE) {
                if collector.is_full(EntityKind::Producto) {
                    break 'catalog;
                }
                let span = Span::new(m.start(), m.end());
                if !collector.is_claimed(&span) {
                    collector.accept(EntityKind::Producto, product.name.clone(), span);
                }
            }
        }

        let entities = collector.finish();
        tracing::debug!(
            count = entities.len(),
            hint = ?hint,
            "Extracted entities"
        );
        entities
    }

    fn apply_rule(
        &self,
        rule: &EntityRule,
        kind: EntityKind,
        normalized: &NormalizedText,
        original: &str,
        collector: &mut Collector,
    ) {
        let text = normalized.as_str();
        for caps in rule.regex.captures_iter(text).take(MAX_MATCHES_PER_RULE) {
            if collector.is_full(kind) {
                return;
            }
            let Some(m) = caps.get(rule.group) else {
                continue;
            };

            let span = Span::new(m.start(), m.end());
            if collector.is_claimed(&span) {
                continue;
            }
            if rule.bare_number && !is_standalone_number(text, m.start(), m.end()) {
                continue;
            }

            let raw = match rule.source {
                ValueSource::Normalized => Cow::Borrowed(m.as_str()),
                ValueSource::Original => source_spelling(normalized, original, m.start(), m.end())
                    .map_or(Cow::Borrowed(m.as_str()), Cow::Owned),
            };
            if let Some(value) = canonical_value(&raw, rule.format, self.config.max_value_chars) {
                collector.accept(kind, value, span);
            }
        }
    }
}

fn bare_number_kind(hint: Option<Intent>, default: EntityKind) -> EntityKind {
    match hint {
        Some(Intent::ConsultarStock | Intent::ConsultarPrecio) => EntityKind::Producto,
        _ => default,
    }
}

/// A bare digit run that is not part of a larger token
///
/// Rejects pieces of hyphenated ids (`orden-2025-001`), decimals and
/// thousands-separated amounts (`1.500,50`) and currency amounts (`$500`).
fn is_standalone_number(text: &str, start: usize, end: usize) -> bool {
    let mut before = text[..start].chars().rev();
    let mut after = text[end..].chars();
    let (prev, prev2) = (before.next(), before.next());
    let (next, next2) = (after.next(), after.next());

    let is_digit = |c: Option<char>| c.map_or(false, |c| c.is_ascii_digit());

    if prev == Some('-') || next == Some('-') || prev == Some('$') {
        return false;
    }
    if matches!(next, Some('.' | ',')) && is_digit(next2) {
        return false;
    }
    if matches!(prev, Some('.' | ',')) && is_digit(prev2) {
        return false;
    }
    true
}

/// The input spelling of `start..end`, without invisible characters
fn source_spelling(
    normalized: &NormalizedText,
    original: &str,
    start: usize,
    end: usize,
) -> Option<String> {
    let range = normalized.source_range(start, end)?;
    let spelling: String = original
        .get(range)?
        .chars()
        .filter(|c| !c.is_other_format() && !c.is_control())
        .collect();
    (!spelling.is_empty()).then_some(spelling)
}

fn canonical_value(raw: &str, format: ValueFormat, max_chars: usize) -> Option<String> {
    if raw.is_empty() || raw.chars().count() > max_chars {
        return None;
    }
    match format {
        ValueFormat::Raw => Some(raw.to_string()),
        ValueFormat::Uppercase => Some(raw.to_uppercase()),
        ValueFormat::Price => canonical_price(raw),
    }
}

/// Canonical decimal form of a price
///
/// The last separator is the decimal point when one or two digits follow it
/// (`99,90`, `1.500,50`); any other separator groups thousands (`1.500`).
fn canonical_price(raw: &str) -> Option<String> {
    let (integer, fraction) = match raw.rfind(|c: char| c == '.' || c == ',') {
        Some(idx) if raw.len() - idx - 1 <= 2 => (&raw[..idx], &raw[idx + 1..]),
        _ => (raw, ""),
    };

    let digits: String = integer.chars().filter(|c| c.is_ascii_digit()).collect();
    let trimmed = digits.trim_start_matches('0');
    let integer = if trimmed.is_empty() { "0" } else { trimmed };

    if digits.is_empty() && fraction.is_empty() {
        return None;
    }

    Some(if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    })
}
