//! Extracted entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity kinds the extractor can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    NumeroPedido,
    TrackingId,
    Precio,
    Producto,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::NumeroPedido,
        EntityKind::TrackingId,
        EntityKind::Precio,
        EntityKind::Producto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumeroPedido => "numero_pedido",
            Self::TrackingId => "tracking_id",
            Self::Precio => "precio",
            Self::Producto => "producto",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte range into the normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Half-open overlap test
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A structured value pulled out of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    /// Canonical value (uppercased ids, normalized price numbers, catalog names)
    pub value: String,
    pub span: Span,
}

impl Entity {
    pub fn new(kind: EntityKind, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
        }
    }
}
