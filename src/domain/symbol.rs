//! Ticker symbol newtype.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A ticker symbol, normalized to uppercase at construction.
///
/// The cache keeps at most one row per symbol, so normalization here is what
/// makes `aapl` and `AAPL` the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol from raw caller input, trimming whitespace and
    /// uppercasing.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Symbol {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_uppercase() {
        assert_eq!(Symbol::new("aapl").as_str(), "AAPL");
        assert_eq!(Symbol::new("  msft "), Symbol::new("MSFT"));
    }

    #[test]
    fn empty_input_yields_empty_symbol() {
        assert!(Symbol::new("   ").is_empty());
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&Symbol::new("spy")).unwrap();
        assert_eq!(json, "\"SPY\"");
    }
}
