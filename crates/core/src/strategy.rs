//! Response strategy capability
//!
//! The engine only classifies. Business replies (order lookups, stock and
//! price queries, complaint tickets) live in a strategy layer outside this
//! workspace, one strategy per intent. This module defines the seam that layer
//! plugs into.
//!
//! # Example
//!
//! ```ignore
//! use order_nlu_core::{StrategyRouter, ResponseStrategy};
//!
//! let mut router = StrategyRouter::new();
//! router.register(Box::new(TrackingStrategy::new(logistics_client)));
//! router.register(Box::new(FallbackStrategy));
//!
//! if let Some(reply) = router.dispatch(&nlu_response) {
//!     send(reply.message);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ClassificationResult, Entity, EntityKind, Intent, NluResponse, Span};

/// Reply produced by a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResponse {
    pub intent: Intent,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl StrategyResponse {
    pub fn new(intent: Intent, message: impl Into<String>) -> Self {
        Self {
            intent,
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Handler for one intent
pub trait ResponseStrategy: Send + Sync {
    /// Intent this strategy answers
    fn intent(&self) -> Intent;

    fn handle(&self, result: &ClassificationResult, entities: &[Entity]) -> StrategyResponse;
}

/// Intent-keyed strategy registry
///
/// Dispatch falls back to the strategy registered for
/// `intencion_desconocida` when the winning intent has none.
#[derive(Default)]
pub struct StrategyRouter {
    strategies: HashMap<Intent, Box<dyn ResponseStrategy>>,
}

impl StrategyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy, replacing any previous one for the same intent
    pub fn register(&mut self, strategy: Box<dyn ResponseStrategy>) {
        let intent = strategy.intent();
        if self.strategies.insert(intent, strategy).is_some() {
            tracing::debug!(intent = %intent, "Replaced response strategy");
        }
    }

    pub fn has_strategy(&self, intent: Intent) -> bool {
        self.strategies.contains_key(&intent)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn dispatch(&self, response: &NluResponse) -> Option<StrategyResponse> {
        let strategy = self
            .strategies
            .get(&response.intent)
            .or_else(|| self.strategies.get(&Intent::IntencionDesconocida))?;

        let entities: Vec<Entity> = response
            .entities
            .iter()
            .map(|e| Entity::new(e.label, e.value.clone(), Span::new(e.start, e.end)))
            .collect();

        Some(strategy.handle(&response.classification(), &entities))
    }
}

/// First value of `kind` among `entities`
pub fn first_value(entities: &[Entity], kind: EntityKind) -> Option<&str> {
    entities
        .iter()
        .find(|e| e.kind == kind)
        .map(|e| e.value.as_str())
}
