//! Application state

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use order_nlu_config::Settings;
use order_nlu_text_processing::NluEngine;

use crate::ServerError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<NluEngine>,
    /// Prometheus handle; `None` disables `/metrics`
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(engine: Arc<NluEngine>) -> Self {
        Self {
            engine,
            metrics: None,
        }
    }

    /// Build the engine from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, ServerError> {
        let engine = NluEngine::new(settings)
            .map_err(|e| ServerError::Internal(format!("failed to build engine: {}", e)))?;
        Ok(Self::new(Arc::new(engine)))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_settings() {
        let state = AppState::from_settings(&Settings::default()).unwrap();
        assert!(state.metrics.is_none());
        assert!(state.engine.registry().rule_count() > 0);
    }

    #[test]
    fn test_missing_patterns_file_is_error() {
        let mut settings = Settings::default();
        settings.patterns_path = Some("/nonexistent/patterns.yaml".to_string());
        assert!(AppState::from_settings(&settings).is_err());
    }
}
