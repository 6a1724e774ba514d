//! Price quotes reported by individual sources.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One source's price for one HBAR, in fiat units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Name the source is registered under.
    pub source: String,
    /// Reported price.
    pub price: Decimal,
}

impl Quote {
    /// Create a new quote.
    pub fn new(source: impl Into<String>, price: Decimal) -> Self {
        Self {
            source: source.into(),
            price,
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.source, self.price)
    }
}
