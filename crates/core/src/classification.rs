//! Classification results

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::Intent;

/// Raw score accumulated by one intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub intent: Intent,
    pub raw_score: f64,
    /// Number of distinct rules that fired for this intent
    pub matched_rule_count: usize,
}

impl ScoredCandidate {
    pub fn new(intent: Intent, raw_score: f64, matched_rule_count: usize) -> Self {
        Self {
            intent,
            raw_score,
            matched_rule_count,
        }
    }

    /// Ranking order: higher score first, then intent priority
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .raw_score
            .total_cmp(&self.raw_score)
            .then_with(|| self.intent.priority().cmp(&other.intent.priority()))
    }
}

/// Outcome of classifying one normalized message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: Intent,
    /// Calibrated certainty in [0, 1]
    pub confidence: f64,
    /// Every intent with a positive score, highest first
    pub all_candidates: Vec<ScoredCandidate>,
    /// The top two scores are close enough to signal multi-intent text
    pub is_ambiguous: bool,
}

impl ClassificationResult {
    /// Result for text that matched nothing
    pub fn unknown() -> Self {
        Self {
            intent: Intent::IntencionDesconocida,
            confidence: 0.0,
            all_candidates: Vec::new(),
            is_ambiguous: false,
        }
    }

    pub fn top(&self) -> Option<&ScoredCandidate> {
        self.all_candidates.first()
    }

    pub fn runner_up(&self) -> Option<&ScoredCandidate> {
        self.all_candidates.get(1)
    }

    pub fn score_of(&self, intent: Intent) -> f64 {
        self.all_candidates
            .iter()
            .find(|c| c.intent == intent)
            .map(|c| c.raw_score)
            .unwrap_or(0.0)
    }

    pub fn is_confident(&self, threshold: f64) -> bool {
        !self.intent.is_unknown() && self.confidence >= threshold
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::unknown()
    }
}
