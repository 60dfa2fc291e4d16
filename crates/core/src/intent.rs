//! Business intents
//!
//! The intent set is closed. `IntencionDesconocida` is the terminal fallback:
//! no pattern ever targets it, the classifier assigns it when nothing clears
//! the confidence floor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Customer intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Where is my order
    TrackearPedido,
    /// Is a product in stock
    ConsultarStock,
    /// How much does something cost
    ConsultarPrecio,
    /// Cancel, modify or return an order
    CambiarPedido,
    /// Complaint about product or service
    QuejaReclamo,
    /// Greeting
    Saludo,
    /// Thanks or goodbye
    Agradecimiento,
    /// Fallback when no intent is confident enough
    #[default]
    IntencionDesconocida,
}

impl Intent {
    /// All intents, in priority order
    pub const ALL: [Intent; 8] = [
        Intent::TrackearPedido,
        Intent::ConsultarStock,
        Intent::ConsultarPrecio,
        Intent::CambiarPedido,
        Intent::QuejaReclamo,
        Intent::Saludo,
        Intent::Agradecimiento,
        Intent::IntencionDesconocida,
    ];

    /// Intents that pattern rules may target
    pub const SCORED: [Intent; 7] = [
        Intent::TrackearPedido,
        Intent::ConsultarStock,
        Intent::ConsultarPrecio,
        Intent::CambiarPedido,
        Intent::QuejaReclamo,
        Intent::Saludo,
        Intent::Agradecimiento,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrackearPedido => "trackear_pedido",
            Self::ConsultarStock => "consultar_stock",
            Self::ConsultarPrecio => "consultar_precio",
            Self::CambiarPedido => "cambiar_pedido",
            Self::QuejaReclamo => "queja_reclamo",
            Self::Saludo => "saludo",
            Self::Agradecimiento => "agradecimiento",
            Self::IntencionDesconocida => "intencion_desconocida",
        }
    }

    /// Tie-break rank, lower wins
    ///
    /// Transactional intents outrank conversational ones, which outrank the
    /// unknown fallback.
    pub fn priority(&self) -> u8 {
        match self {
            Self::TrackearPedido => 0,
            Self::ConsultarStock => 1,
            Self::ConsultarPrecio => 2,
            Self::CambiarPedido => 3,
            Self::QuejaReclamo => 4,
            Self::Saludo => 5,
            Self::Agradecimiento => 6,
            Self::IntencionDesconocida => 7,
        }
    }

    pub fn is_transactional(&self) -> bool {
        matches!(
            self,
            Self::TrackearPedido | Self::ConsultarStock | Self::ConsultarPrecio | Self::CambiarPedido
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::IntencionDesconocida)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| crate::Error::config(format!("unknown intent '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_matches_all() {
        let priorities: Vec<u8> = Intent::ALL.iter().map(|i| i.priority()).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
        assert_eq!(Intent::IntencionDesconocida.priority(), 7);
    }

    #[test]
    fn test_scored_excludes_unknown() {
        assert!(!Intent::SCORED.contains(&Intent::IntencionDesconocida));
        assert_eq!(Intent::SCORED.len(), Intent::ALL.len() - 1);
    }

    #[test]
    fn test_wire_names_roundtrip() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(json, format!("\"{}\"", intent.as_str()));
        }
        assert!("tracking".parse::<Intent>().is_err());
    }

    #[test]
    fn test_transactional() {
        assert!(Intent::TrackearPedido.is_transactional());
        assert!(Intent::CambiarPedido.is_transactional());
        assert!(!Intent::Saludo.is_transactional());
        assert!(!Intent::IntencionDesconocida.is_transactional());
    }
}
