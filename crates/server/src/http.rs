//! HTTP Endpoints
//!
//! REST API for the NLU engine.

use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use order_nlu_config::ServerConfig;
use order_nlu_core::{Intent, NluResponse, RawMessage, DEFAULT_CHANNEL_USER_ID};

use crate::metrics::{record_response, record_validation_error};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router with default server settings
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, &ServerConfig::default())
}

/// Create the application router
pub fn create_router_with_config(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/process", post(process))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeout_seconds)))
        .layer(TraceLayer::new_for_http());

    let router = if config.cors_enabled {
        router.layer(build_cors_layer(&config.cors_origins))
    } else {
        router
    };

    router.with_state(state)
}

/// Build CORS layer from configured origins
///
/// An empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    tracing::info!("CORS configured with {} origins", parsed.len());
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Body of `POST /process`
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
    #[serde(default)]
    pub channel_user_id: Option<String>,
    /// Intent of the previous turn, used to label bare numbers
    #[serde(default)]
    pub prior_intent: Option<Intent>,
}

async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<NluResponse>, ServerError> {
    let channel_user_id = request
        .channel_user_id
        .unwrap_or_else(|| DEFAULT_CHANNEL_USER_ID.to_string());
    let message = RawMessage::new(request.text, channel_user_id);

    match state.engine.process_with_hint(&message, request.prior_intent) {
        Ok(response) => {
            record_response(&response);
            tracing::debug!(
                channel_user_id = %response.channel_user_id,
                text = %state.engine.normalizer().display_safe(&message.text),
                intent = %response.intent,
                "Message classified"
            );
            Ok(Json(response))
        }
        Err(e) => {
            if e.is_validation() {
                record_validation_error();
                tracing::warn!(
                    channel_user_id = %message.channel_user_id,
                    error = %e,
                    "Rejected message"
                );
            } else {
                tracing::error!(error = %e, "Processing failed");
            }
            Err(e.into())
        }
    }
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let registry = state.engine.registry();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "pattern_version": registry.version(),
            "intents": Intent::ALL.len(),
            "rules": registry.rule_count(),
        })),
    )
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            "metrics disabled".to_string(),
        ),
    }
}
