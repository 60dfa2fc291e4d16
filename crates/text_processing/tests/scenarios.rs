//! End-to-end classification scenarios
//!
//! These run the embedded pattern table through the full engine and pin the
//! calibration: intents, ambiguity and confidence bands for a labelled corpus
//! of real-world customer phrasing.

use order_nlu_core::{EntityKind, Intent, RawMessage};
use order_nlu_text_processing::NluEngine;

fn engine() -> NluEngine {
    NluEngine::builtin().unwrap()
}

/// Tracking request with an order number
#[test]
fn test_scenario_tracking_with_order_number() {
    let response = engine()
        .process(&RawMessage::anonymous("Hola, donde esta mi pedido 12345?"))
        .unwrap();

    assert_eq!(response.intent, Intent::TrackearPedido);
    assert!(response.confidence >= 0.8, "confidence {}", response.confidence);
    assert!(!response.is_ambiguous);
    assert_eq!(response.entity(EntityKind::NumeroPedido), Some("12345"));
}

/// Stock question, entities optional
#[test]
fn test_scenario_stock_question() {
    let response = engine()
        .process(&RawMessage::anonymous("tienen stock de zapatillas?"))
        .unwrap();

    assert_eq!(response.intent, Intent::ConsultarStock);
    assert!(response.confidence > 0.9);
    assert!(response
        .entities_of(EntityKind::Producto)
        .all(|e| e.value == "zapatillas"));
}

/// Empty text is rejected
#[test]
fn test_scenario_empty_text() {
    let err = engine().process(&RawMessage::anonymous("")).unwrap_err();
    assert!(err.is_validation());
}

/// Ten thousand digits classify as unknown without blowing up
#[test]
fn test_scenario_digit_flood() {
    let response = engine()
        .process(&RawMessage::anonymous("7".repeat(10_000)))
        .unwrap();

    assert_eq!(response.intent, Intent::IntencionDesconocida);
    assert_eq!(response.confidence, 0.0);
    assert!(response.entities.len() <= 10);
    assert!(response.normalized_text.chars().count() <= 2000);
}

/// Tracking and price cues of near-equal weight
#[test]
fn test_scenario_mixed_tracking_and_price() {
    let response = engine()
        .process(&RawMessage::anonymous("donde está mi pedido y cuánto cuesta?"))
        .unwrap();

    assert!(response.is_ambiguous);
    assert_eq!(response.intent, Intent::TrackearPedido);
    assert!(response.confidence < 0.8, "confidence {}", response.confidence);
    assert!(response.confidence >= 0.3);
    assert_eq!(response.candidates.len(), 2);
}

#[test]
fn test_labelled_corpus() {
    let engine = engine();
    let corpus: &[(&str, Intent)] = &[
        // tracking
        ("¿Dónde está mi pedido 12345?", Intent::TrackearPedido),
        ("necesito rastrear el envio trk-123456", Intent::TrackearPedido),
        ("cuando llega mi paquete?", Intent::TrackearPedido),
        ("ola, m podes decir xq no llega mi envio 555?", Intent::TrackearPedido),
        ("Quiero saber el seguimiento de mi compra", Intent::TrackearPedido),
        // stock
        ("tienen stock de zapatillas?", Intent::ConsultarStock),
        ("hay disponibilidad del buzo negro?", Intent::ConsultarStock),
        ("les quedan remeras disponibles?", Intent::ConsultarStock),
        ("esta agotado el producto 4455?", Intent::ConsultarStock),
        // price
        ("cual es el valor de este articulo?", Intent::ConsultarPrecio),
        ("me decis qe precio tiene esto?", Intent::ConsultarPrecio),
        ("cuanto sale la campera?", Intent::ConsultarPrecio),
        ("a cuanto esta el buzo?", Intent::ConsultarPrecio),
        // change
        ("quiero cancelar mi pedido 12345", Intent::CambiarPedido),
        ("me equivoque en mi orden, puedo cambiarla?", Intent::CambiarPedido),
        ("quiero devolver las zapatillas", Intent::CambiarPedido),
        // complaint
        ("tengo un problema con mi pedido", Intent::QuejaReclamo),
        ("pesimo servicio, el producto llego roto", Intent::QuejaReclamo),
        ("quiero hacer un reclamo", Intent::QuejaReclamo),
        // greeting
        ("Hola", Intent::Saludo),
        ("buenas tardes!", Intent::Saludo),
        ("holaaaa, que tal?", Intent::Saludo),
        // thanks
        ("Muchas gracias", Intent::Agradecimiento),
        ("genial, gracias, chau!", Intent::Agradecimiento),
        ("grax, muy amable", Intent::Agradecimiento),
    ];

    let mut failures = Vec::new();
    for (text, expected) in corpus {
        let result = engine.classify_text(text);
        if result.intent != *expected {
            failures.push(format!(
                "{:?}: expected {}, got {} ({:.3})",
                text, expected, result.intent, result.confidence
            ));
        }
    }
    assert!(failures.is_empty(), "misclassified:\n{}", failures.join("\n"));
}

#[test]
fn test_change_outranks_tracking_without_ambiguity() {
    let result = engine().classify_text("quiero cancelar mi pedido 12345");
    assert_eq!(result.intent, Intent::CambiarPedido);
    assert!(!result.is_ambiguous);
    assert_eq!(result.runner_up().unwrap().intent, Intent::TrackearPedido);
}

#[test]
fn test_slang_heavy_tracking_confidence() {
    let result = engine().classify_text("ola, m podes decir xq no llega mi envio 555?");
    assert_eq!(result.intent, Intent::TrackearPedido);
    assert!(!result.is_ambiguous);
    assert!((result.confidence - 0.748).abs() < 1e-3, "{}", result.confidence);
}

#[test]
fn test_single_signal_confidence_band() {
    let engine = engine();
    for text in ["Hola", "cual es el valor de este articulo?", "me decis qe precio tiene esto?"] {
        let result = engine.classify_text(text);
        assert!(
            (result.confidence - 0.626).abs() < 1e-3,
            "{:?}: {}",
            text,
            result.confidence
        );
    }
}

#[test]
fn test_greeting_and_thanks_tie_goes_to_greeting() {
    let result = engine().classify_text("hola gracias");
    assert!(result.is_ambiguous);
    assert_eq!(result.intent, Intent::Saludo);
    assert!(result.confidence < 0.8);
}

#[test]
fn test_entities_survive_unknown_intent() {
    let response = engine()
        .process(&RawMessage::anonymous("TRK-998877"))
        .unwrap();
    assert_eq!(response.intent, Intent::IntencionDesconocida);
    assert_eq!(response.entity(EntityKind::TrackingId), Some("TRK-998877"));
}

#[test]
fn test_response_wire_format() {
    let response = engine()
        .process(&RawMessage::new("precio del producto 4455?", "web:42"))
        .unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["intent"], "consultar_precio");
    assert_eq!(json["channel_user_id"], "web:42");
    assert_eq!(json["entities"][0]["label"], "producto");
    assert_eq!(json["entities"][0]["value"], "4455");
    assert_eq!(json["original_text"], "precio del producto 4455?");
}

#[test]
fn test_tracking_id_keeps_repeated_letters() {
    let response = engine()
        .process(&RawMessage::anonymous("Hola, mi envio TRK-AAA123 no llega"))
        .unwrap();

    assert_eq!(response.intent, Intent::TrackearPedido);
    assert_eq!(response.entity(EntityKind::TrackingId), Some("TRK-AAA123"));
    assert!(response.normalized_text.contains("trk-a123"));
}
