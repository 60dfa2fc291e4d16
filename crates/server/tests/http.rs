//! HTTP API tests
//!
//! Drives the router in-process; no socket is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use once_cell::sync::OnceCell;
use tower::ServiceExt;

use order_nlu_config::ServerConfig;
use order_nlu_server::http::create_router_with_config;
use order_nlu_server::{create_router, init_metrics, AppState};
use order_nlu_text_processing::NluEngine;

fn app() -> Router {
    let engine = NluEngine::builtin().unwrap();
    create_router(AppState::new(Arc::new(engine)))
}

/// The recorder is global, so it is installed once for the whole test binary
fn metrics_handle() -> PrometheusHandle {
    static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
    HANDLE.get_or_init(|| init_metrics().unwrap()).clone()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_process_tracking_message() {
    let resp = app()
        .oneshot(post_json(
            "/process",
            r#"{"text": "Hola, donde esta mi pedido 12345?", "channel_user_id": "wa:1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["intent"], "trackear_pedido");
    assert_eq!(json["is_ambiguous"], false);
    assert_eq!(json["channel_user_id"], "wa:1");
    assert_eq!(json["entities"][0]["label"], "numero_pedido");
    assert_eq!(json["entities"][0]["value"], "12345");
    assert!(json["confidence"].as_f64().unwrap() >= 0.8);
}

#[tokio::test]
async fn test_process_defaults_channel_user_id() {
    let resp = app()
        .oneshot(post_json("/process", r#"{"text": "muchas gracias"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["intent"], "agradecimiento");
    assert_eq!(json["channel_user_id"], "unknown");
}

#[tokio::test]
async fn test_process_with_prior_intent() {
    let resp = app()
        .oneshot(post_json(
            "/process",
            r#"{"text": "y el 4455?", "prior_intent": "consultar_precio"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["entities"][0]["label"], "producto");
    assert_eq!(json["entities"][0]["value"], "4455");
}

#[tokio::test]
async fn test_empty_text_is_unprocessable() {
    let resp = app()
        .oneshot(post_json("/process", r#"{"text": ""}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(resp).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let resp = app()
        .oneshot(post_json("/process", r#"{"text": "#))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());

    let resp = app()
        .oneshot(post_json("/process", r#"{"message": "hola"}"#))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let config = ServerConfig {
        max_body_bytes: 64,
        ..ServerConfig::default()
    };
    let app = create_router_with_config(
        AppState::new(Arc::new(NluEngine::builtin().unwrap())),
        &config,
    );
    let body = format!(r#"{{"text": "{}"}}"#, "hola ".repeat(100));

    let resp = app.oneshot(post_json("/process", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_health() {
    let resp = app().oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["intents"], 8);
    assert!(json["pattern_version"].is_string());
    assert!(json["rules"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_metrics_disabled() {
    let resp = app().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let state = AppState::new(Arc::new(NluEngine::builtin().unwrap())).with_metrics(metrics_handle());
    let app = create_router(state);

    let resp = app
        .clone()
        .oneshot(post_json("/process", r#"{"text": "hola, tienen stock?"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(post_json("/process", r#"{"text": ""}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("nlu_requests_total"));
    assert!(text.contains("nlu_validation_errors_total"));
    assert!(text.contains("nlu_confidence"));
}
