//! Request and response payloads of the classification facade

use serde::{Deserialize, Serialize};

use crate::{ClassificationResult, Entity, EntityKind, Intent, ScoredCandidate};

pub const DEFAULT_CHANNEL_USER_ID: &str = "unknown";

fn default_channel_user_id() -> String {
    DEFAULT_CHANNEL_USER_ID.to_string()
}

/// Inbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub text: String,
    #[serde(default = "default_channel_user_id")]
    pub channel_user_id: String,
}

impl RawMessage {
    pub fn new(text: impl Into<String>, channel_user_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            channel_user_id: channel_user_id.into(),
        }
    }

    /// Message from an unidentified channel user
    pub fn anonymous(text: impl Into<String>) -> Self {
        Self::new(text, DEFAULT_CHANNEL_USER_ID)
    }
}

/// Entity as exposed on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEntity {
    pub label: EntityKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl From<&Entity> for ResponseEntity {
    fn from(entity: &Entity) -> Self {
        Self {
            label: entity.kind,
            value: entity.value.clone(),
            start: entity.span.start,
            end: entity.span.end,
        }
    }
}

/// Facade output consumed by the strategy layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluResponse {
    pub intent: Intent,
    pub confidence: f64,
    pub is_ambiguous: bool,
    pub candidates: Vec<ScoredCandidate>,
    pub entities: Vec<ResponseEntity>,
    pub normalized_text: String,
    pub original_text: String,
    pub channel_user_id: String,
}

impl NluResponse {
    pub fn new(
        message: &RawMessage,
        normalized_text: String,
        classification: ClassificationResult,
        entities: &[Entity],
    ) -> Self {
        Self {
            intent: classification.intent,
            confidence: classification.confidence,
            is_ambiguous: classification.is_ambiguous,
            candidates: classification.all_candidates,
            entities: entities.iter().map(ResponseEntity::from).collect(),
            normalized_text,
            original_text: message.text.clone(),
            channel_user_id: message.channel_user_id.clone(),
        }
    }

    /// Classification view of this response
    pub fn classification(&self) -> ClassificationResult {
        ClassificationResult {
            intent: self.intent,
            confidence: self.confidence,
            all_candidates: self.candidates.clone(),
            is_ambiguous: self.is_ambiguous,
        }
    }

    /// First entity value of the given kind
    pub fn entity(&self, kind: EntityKind) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| e.label == kind)
            .map(|e| e.value.as_str())
    }

    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &ResponseEntity> {
        self.entities.iter().filter(move |e| e.label == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    #[test]
    fn test_channel_user_id_defaults() {
        let msg: RawMessage = serde_json::from_str(r#"{"text": "hola"}"#).unwrap();
        assert_eq!(msg.channel_user_id, "unknown");
        assert_eq!(msg, RawMessage::anonymous("hola"));
    }

    #[test]
    fn test_response_serializes_labels() {
        let msg = RawMessage::new("Pedido 12345", "wa:5491100000000");
        let entities = vec![Entity::new(EntityKind::NumeroPedido, "12345", Span::new(7, 12))];
        let mut classification = ClassificationResult::unknown();
        classification.intent = Intent::TrackearPedido;
        classification.confidence = 0.41;

        let response = NluResponse::new(&msg, "pedido 12345".into(), classification, &entities);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["intent"], "trackear_pedido");
        assert_eq!(json["entities"][0]["label"], "numero_pedido");
        assert_eq!(json["entities"][0]["value"], "12345");
        assert_eq!(json["original_text"], "Pedido 12345");
        assert_eq!(json["channel_user_id"], "wa:5491100000000");
        assert_eq!(response.entity(EntityKind::NumeroPedido), Some("12345"));
        assert_eq!(response.classification().intent, Intent::TrackearPedido);
    }
}
