//! Core types for the customer-message NLU engine
//!
//! This crate provides the foundational types shared across all other crates:
//! - The closed set of business intents and their tie-break priority
//! - Entity kinds, spans and extracted entities
//! - Classification results and the facade's response payload
//! - The capability trait implemented by downstream response strategies
//! - Error types

pub mod error;
pub mod intent;
pub mod entity;
pub mod classification;
pub mod message;
pub mod strategy;

pub use classification::{ClassificationResult, ScoredCandidate};
pub use entity::{Entity, EntityKind, Span};
pub use error::{Error, Result};
pub use intent::Intent;
pub use message::{NluResponse, RawMessage, ResponseEntity, DEFAULT_CHANNEL_USER_ID};
pub use strategy::{ResponseStrategy, StrategyResponse, StrategyRouter};
