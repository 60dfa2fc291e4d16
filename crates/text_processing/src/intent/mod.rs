//! Intent classification
//!
//! Rule-based scoring over normalized text. Each intent accumulates
//! `weight * matches` over its rules, with matches of a single rule capped so
//! repetition cannot dominate. The top score is turned into a calibrated
//! confidence:
//!
//! ```text
//! strength   = 1 - exp(-top / saturation)
//! margin     = (top - second) / top
//! confidence = strength * (0.7 + 0.3 * margin)      (x penalty if one rule fired)
//! ```
//!
//! Close top-two scores mark the result ambiguous and hand the win to the
//! higher-priority intent among the near-tied candidates that clear the score
//! floor. Strength and margin always describe the top of the ranking, so an
//! ambiguous result carries the confidence of the contested cluster; the
//! single-rule penalty follows the winner's own support. Weak or
//! low-confidence results become `intencion_desconocida`.

use std::sync::Arc;

use order_nlu_config::constants::classifier::MARGIN_WEIGHT;
use order_nlu_config::ClassifierConfig;
use order_nlu_core::{ClassificationResult, Intent, ScoredCandidate};

use crate::normalize::NormalizedText;
use crate::registry::PatternRegistry;

/// Rule-based intent classifier
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    registry: Arc<PatternRegistry>,
    config: ClassifierConfig,
}

impl IntentClassifier {
    pub fn new(registry: Arc<PatternRegistry>, config: ClassifierConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify normalized text
    pub fn classify(&self, text: &NormalizedText) -> ClassificationResult {
        let candidates = self.score(text);

        let Some(top) = candidates.first() else {
            return ClassificationResult::unknown();
        };

        let top_score = top.raw_score;
        let second_score = candidates.get(1).map_or(0.0, |c| c.raw_score);
        let delta = self.config.ambiguity_delta;

        let is_ambiguous =
            second_score >= self.config.score_floor && top_score - second_score <= delta;

        // Among the near-tied above the floor, the business priority decides
        let winner = if is_ambiguous {
            candidates
                .iter()
                .take_while(|c| top_score - c.raw_score <= delta)
                .filter(|c| c.raw_score >= self.config.score_floor)
                .min_by_key(|c| c.intent.priority())
                .unwrap_or(top)
        } else {
            top
        };

        let confidence = self.confidence(top_score, second_score, winner.matched_rule_count);

        let intent = if top_score < self.config.score_floor
            || confidence < self.config.confidence_threshold
        {
            Intent::IntencionDesconocida
        } else {
            winner.intent
        };

        tracing::debug!(
            intent = %intent,
            confidence,
            top_score,
            second_score,
            ambiguous = is_ambiguous,
            "Classified message"
        );

        ClassificationResult {
            intent,
            confidence,
            all_candidates: candidates,
            is_ambiguous,
        }
    }

    /// Raw scores of every intent with at least one matching rule, ranked
    pub fn score(&self, text: &NormalizedText) -> Vec<ScoredCandidate> {
        let text = text.as_str();
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<ScoredCandidate> = Intent::SCORED
            .iter()
            .filter_map(|&intent| self.score_intent(text, intent))
            .collect();

        candidates.sort_by(ScoredCandidate::rank_cmp);
        candidates
    }

    fn score_intent(&self, text: &str, intent: Intent) -> Option<ScoredCandidate> {
        let mut score = 0.0;
        let mut matched_rules = 0;

        for rule in self.registry.rules_for(intent) {
            let hits = rule.count_matches(text, self.config.repeat_cap);
            if hits > 0 {
                score += rule.weight * hits as f64;
                matched_rules += 1;
            }
        }

        (score > 0.0).then(|| ScoredCandidate::new(intent, score, matched_rules))
    }

    fn confidence(&self, top: f64, second: f64, matched_rules: usize) -> f64 {
        if top <= 0.0 {
            return 0.0;
        }

        let strength = 1.0 - (-top / self.config.saturation).exp();
        let margin = ((top - second) / top).clamp(0.0, 1.0);
        let mut confidence = strength * ((1.0 - MARGIN_WEIGHT) + MARGIN_WEIGHT * margin);

        if matched_rules == 1 {
            confidence *= self.config.single_rule_penalty;
        }

        confidence.clamp(0.0, 1.0)
    }
}
