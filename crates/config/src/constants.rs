//! Centralized constants for the NLU engine
//!
//! Single source of truth for the default values used by the settings
//! loader and by the engine's `Default` impls.

/// HTTP adapter defaults
pub mod endpoints {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8001;
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
    /// Request body limit (64 KiB)
    pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
}

/// Normalizer bounds
pub mod normalizer {
    /// Maximum normalized length, in chars
    pub const DEFAULT_MAX_CHARS: usize = 2000;
    pub const MIN_MAX_CHARS: usize = 32;
    /// Input chars inspected per output char before truncation kicks in
    pub const PRESCAN_FACTOR: usize = 8;
    /// Slang tokens longer than this are never substituted
    pub const MAX_SLANG_TOKEN_CHARS: usize = 12;
}

/// Classifier calibration
///
/// These are tunable, validated against the scenario corpus in the
/// text_processing integration tests.
pub mod classifier {
    /// Minimum top raw score for a non-unknown result
    pub const SCORE_FLOOR: f64 = 1.0;
    /// Minimum confidence for a non-unknown result
    pub const CONFIDENCE_THRESHOLD: f64 = 0.3;
    /// Top-two score gap at or below which a result is ambiguous
    pub const AMBIGUITY_DELTA: f64 = 0.75;
    /// Max matches of a single rule that count towards the score
    pub const REPEAT_CAP: usize = 2;
    /// Confidence at or above which a result counts as high-confidence
    pub const HIGH_CONFIDENCE: f64 = 0.8;
    /// Score scale of the strength curve `1 - exp(-score / saturation)`
    pub const SATURATION: f64 = 1.5;
    /// Multiplier applied when only one rule fired
    pub const SINGLE_RULE_PENALTY: f64 = 0.85;
    /// Weight of the top-two margin in the confidence factor
    pub const MARGIN_WEIGHT: f64 = 0.3;
}

/// Entity extraction bounds
pub mod entities {
    pub const MAX_PER_KIND: usize = 10;
    pub const MAX_VALUE_CHARS: usize = 40;
    /// Matches inspected per rule before giving up
    pub const MAX_MATCHES_PER_RULE: usize = 256;
}

/// Pattern table limits enforced by the validator
pub mod patterns {
    /// Slang replacement may grow a token by at most this factor
    pub const MAX_SLANG_EXPANSION: usize = 4;
    pub const BUILTIN_SOURCE: &str = "builtin";
}
