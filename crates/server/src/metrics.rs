//! Prometheus metrics

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use order_nlu_core::NluResponse;

use crate::ServerError;

/// Install the global Prometheus recorder
///
/// Only one recorder can be installed per process.
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))
}

/// Record one processed message
pub fn record_response(response: &NluResponse) {
    metrics::counter!("nlu_requests_total", "intent" => response.intent.as_str()).increment(1);
    metrics::histogram!("nlu_confidence").record(response.confidence);
    for entity in &response.entities {
        metrics::counter!("nlu_entities_total", "kind" => entity.label.as_str()).increment(1);
    }
}

pub fn record_validation_error() {
    metrics::counter!("nlu_validation_errors_total").increment(1);
}
