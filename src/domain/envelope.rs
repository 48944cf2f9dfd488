//! Result envelopes returned across the service boundary.
//!
//! Quote operations never return `Err` to callers: every failure mode is
//! data in the envelope, with a kind that distinguishes "the dependency is
//! known bad" from "this fetch failed" from "the cache itself is broken".

use serde::Serialize;

use crate::domain::quote::{Quote, SnapshotQuote};
use crate::domain::symbol::Symbol;
use crate::error::Error;

/// Classification of an envelope failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Circuit open: the provider is already known bad, do not pile on.
    ServiceUnavailable,
    /// A provider call was attempted and failed.
    FetchFailed,
    /// The cache store itself is unreachable, which also removes the
    /// stale-fallback option.
    CacheUnavailable,
}

impl From<&Error> for FailureKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::CircuitOpen { .. } => FailureKind::ServiceUnavailable,
            Error::Cache(_) => FailureKind::CacheUnavailable,
            _ => FailureKind::FetchFailed,
        }
    }
}

/// Envelope for a single-symbol lookup.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl QuoteEnvelope {
    #[must_use]
    pub fn ok(quote: Quote) -> Self {
        Self {
            success: true,
            quote: Some(quote),
            error: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            quote: None,
            error: Some(message.into()),
            kind: Some(kind),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Envelope for a batch lookup.
///
/// Individual symbol problems surface only in `failed`; the batch as a whole
/// fails only when the initial cache read does.
#[derive(Debug, Clone, Serialize)]
pub struct QuotesEnvelope {
    pub success: bool,
    pub quotes: Vec<Quote>,
    pub failed: Vec<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl QuotesEnvelope {
    #[must_use]
    pub fn ok(quotes: Vec<Quote>, failed: Vec<Symbol>) -> Self {
        Self {
            success: true,
            quotes,
            failed,
            error: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            quotes: Vec::new(),
            failed: Vec::new(),
            error: Some(message.into()),
            kind: Some(kind),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Envelope for a snapshot lookup.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotQuote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl SnapshotEnvelope {
    #[must_use]
    pub fn ok(snapshot: SnapshotQuote) -> Self {
        Self {
            success: true,
            snapshot: Some(snapshot),
            error: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            snapshot: None,
            error: Some(message.into()),
            kind: Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CacheError, ProviderError};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn failure_kind_maps_circuit_open_to_unavailable() {
        let err = Error::CircuitOpen {
            circuit: "market_data".to_string(),
        };
        assert_eq!(FailureKind::from(&err), FailureKind::ServiceUnavailable);
    }

    #[test]
    fn failure_kind_maps_cache_and_provider_errors() {
        let cache: Error = CacheError::Connection("down".to_string()).into();
        assert_eq!(FailureKind::from(&cache), FailureKind::CacheUnavailable);

        let provider: Error = ProviderError::Status {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(FailureKind::from(&provider), FailureKind::FetchFailed);
    }

    #[test]
    fn quote_envelope_serializes_without_null_noise() {
        let envelope = QuoteEnvelope::ok(Quote {
            symbol: Symbol::new("AAPL"),
            price: dec!(187.23),
            timestamp: Utc::now(),
            cached: false,
        });
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn failure_envelope_carries_kind() {
        let envelope = QuoteEnvelope::failure(FailureKind::ServiceUnavailable, "circuit open");
        assert!(!envelope.is_success());
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("service_unavailable"));
    }
}
