//! Classification facade
//!
//! Runs one message through the full pipeline:
//! normalize → classify → extract. The order is fixed; each stage relies on
//! the output invariants of the previous one.

use std::sync::Arc;

use order_nlu_config::{PatternValidator, PatternsConfig, Settings};
use order_nlu_core::{ClassificationResult, Intent, NluResponse, RawMessage};

use crate::entities::EntityExtractor;
use crate::intent::IntentClassifier;
use crate::normalize::{NormalizedText, Normalizer};
use crate::registry::PatternRegistry;
use crate::{NluError, Result};

/// The NLU engine
///
/// Immutable after construction; share it behind an `Arc` across request
/// handlers.
#[derive(Debug, Clone)]
pub struct NluEngine {
    registry: Arc<PatternRegistry>,
    normalizer: Normalizer,
    classifier: IntentClassifier,
    extractor: EntityExtractor,
}

impl NluEngine {
    /// Build from settings, loading the pattern table they point at
    ///
    /// Staging and production refuse tables with validation warnings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let registry = match settings.patterns_path.as_deref() {
            None if !settings.environment.is_strict() => PatternRegistry::shared()?,
            path => {
                let config = PatternsConfig::load_or_builtin(path)?;
                let report = PatternValidator::new().validate(
                    path.unwrap_or(order_nlu_config::constants::patterns::BUILTIN_SOURCE),
                    &config,
                );
                if settings.environment.is_strict() && !report.warnings().is_empty() {
                    return Err(NluError::Config(order_nlu_config::ConfigError::invalid(
                        "patterns",
                        report.summary(),
                    )));
                }
                for warning in report.warnings() {
                    tracing::warn!(issue = %warning, "Pattern table warning");
                }
                Arc::new(PatternRegistry::from_config(&config)?)
            }
        };

        Ok(Self::with_registry(registry, settings))
    }

    /// Build around an already compiled registry
    pub fn with_registry(registry: Arc<PatternRegistry>, settings: &Settings) -> Self {
        let normalizer = Normalizer::new(registry.slang(), settings.normalizer.max_chars);
        let classifier = IntentClassifier::new(Arc::clone(&registry), settings.classifier.clone());
        let extractor = EntityExtractor::new(Arc::clone(&registry), settings.entities.clone());

        Self {
            registry,
            normalizer,
            classifier,
            extractor,
        }
    }

    /// Engine over the embedded table with default settings
    pub fn builtin() -> Result<Self> {
        Ok(Self::with_registry(PatternRegistry::shared()?, &Settings::default()))
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    pub fn normalize(&self, text: &str) -> NormalizedText {
        self.normalizer.normalize(text)
    }

    /// Process one message
    pub fn process(&self, message: &RawMessage) -> Result<NluResponse> {
        self.process_with_hint(message, None)
    }

    /// Process one message with a caller-supplied prior intent
    ///
    /// The prior intent only affects how bare numbers are labelled.
    pub fn process_with_hint(
        &self,
        message: &RawMessage,
        prior_intent: Option<Intent>,
    ) -> Result<NluResponse> {
        if message.text.is_empty() {
            return Err(NluError::Validation("text must not be empty".to_string()));
        }

        let normalized = self.normalizer.normalize(&message.text);
        let classification = self.classifier.classify(&normalized);
        let entities = self
            .extractor
            .extract_with_hint(&normalized, &message.text, prior_intent);

        tracing::debug!(
            channel_user_id = %message.channel_user_id,
            intent = %classification.intent,
            confidence = classification.confidence,
            ambiguous = classification.is_ambiguous,
            entities = entities.len(),
            "Processed message"
        );

        Ok(NluResponse::new(
            message,
            normalized.into_string(),
            classification,
            &entities,
        ))
    }

    /// Normalize and classify raw text
    pub fn classify_text(&self, text: &str) -> ClassificationResult {
        self.classifier.classify(&self.normalizer.normalize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_nlu_config::RuntimeEnvironment;
    use order_nlu_core::EntityKind;

    #[test]
    fn test_process_scenario() {
        let engine = NluEngine::builtin().unwrap();
        let response = engine
            .process(&RawMessage::new("Hola, ¿dónde está mi pedido 12345?", "wa:5491100000000"))
            .unwrap();

        assert_eq!(response.intent, Intent::TrackearPedido);
        assert!(response.confidence >= 0.8);
        assert_eq!(response.entity(EntityKind::NumeroPedido), Some("12345"));
        assert_eq!(response.normalized_text, "hola, ¿donde esta mi pedido 12345?");
        assert_eq!(response.original_text, "Hola, ¿dónde está mi pedido 12345?");
        assert_eq!(response.channel_user_id, "wa:5491100000000");
    }

    #[test]
    fn test_empty_text_is_validation_error() {
        let engine = NluEngine::builtin().unwrap();
        let err = engine.process(&RawMessage::anonymous("")).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_whitespace_only_is_unknown() {
        let engine = NluEngine::builtin().unwrap();
        let response = engine.process(&RawMessage::anonymous(" \t\n ")).unwrap();
        assert_eq!(response.intent, Intent::IntencionDesconocida);
        assert_eq!(response.confidence, 0.0);
        assert!(response.entities.is_empty());
        assert!(response.normalized_text.is_empty());
    }

    #[test]
    fn test_prior_intent_only_relabels_bare_numbers() {
        let engine = NluEngine::builtin().unwrap();
        let message = RawMessage::anonymous("y el 4455?");

        let plain = engine.process(&message).unwrap();
        let hinted = engine
            .process_with_hint(&message, Some(Intent::ConsultarPrecio))
            .unwrap();

        assert_eq!(plain.entity(EntityKind::NumeroPedido), Some("4455"));
        assert_eq!(hinted.entity(EntityKind::Producto), Some("4455"));
        assert_eq!(plain.intent, hinted.intent);
        assert_eq!(plain.confidence, hinted.confidence);
    }

    #[test]
    fn test_new_from_default_settings() {
        let engine = NluEngine::new(&Settings::default()).unwrap();
        assert_eq!(engine.classify_text("muchas gracias!").intent, Intent::Agradecimiento);
    }

    #[test]
    fn test_strict_environment_accepts_builtin_table() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        assert!(NluEngine::new(&settings).is_ok());
    }

    #[test]
    fn test_missing_patterns_file_fails() {
        let mut settings = Settings::default();
        settings.patterns_path = Some("/nonexistent/patterns.yaml".to_string());
        let err = NluEngine::new(&settings).unwrap_err();
        assert!(!err.is_validation());
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NluEngine>();
    }
}
