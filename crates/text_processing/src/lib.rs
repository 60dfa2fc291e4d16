//! Text processing for Spanish customer messages
//!
//! This crate provides the deterministic NLU core:
//! - **Normalization**: case, accents, invisible characters, whitespace and
//!   informal spelling folded into one canonical form
//! - **Pattern Registry**: the compiled, read-only pattern table
//! - **Intent Classification**: weighted rule scoring with calibrated confidence
//! - **Entity Extraction**: order numbers, tracking ids, prices and products
//! - **NluEngine**: the facade composing all of the above
//!
//! # Example
//!
//! ```ignore
//! use order_nlu_core::RawMessage;
//! use order_nlu_text_processing::NluEngine;
//!
//! let engine = NluEngine::builtin()?;
//! let response = engine.process(&RawMessage::anonymous("donde esta mi pedido 12345?"))?;
//! println!("{} ({:.2})", response.intent, response.confidence);
//! ```

pub mod entities;
pub mod intent;
pub mod normalize;
pub mod registry;

mod error;
mod pipeline;

pub use error::{NluError, Result};
pub use pipeline::NluEngine;

pub use entities::EntityExtractor;
pub use intent::IntentClassifier;
pub use normalize::{NormalizedText, Normalizer, SlangTable};
pub use registry::{CatalogEntry, CompiledTrigger, EntityRule, PatternRegistry, PatternRule};
