//! Quote and price-cache value types.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::symbol::Symbol;

/// A point-in-time price answer.
///
/// `cached` is true when the price came out of the cache store (fresh or
/// stale fallback) rather than a live provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub cached: bool,
}

/// An extended quote with daily context, served only from live provider
/// snapshots (never cached).
///
/// The bar-derived fields are optional: a thinly traded symbol may have no
/// daily or previous-daily bar yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotQuote {
    pub symbol: Symbol,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub previous_close: Option<Decimal>,
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub day_high: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub volume: Option<u64>,
}

/// A persisted cache row: at most one per symbol, overwritten on every
/// successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceCacheEntry {
    pub symbol: Symbol,
    pub price: Decimal,
    pub fetched_at: DateTime<Utc>,
    /// Provider tag, e.g. `"alpaca"`.
    pub source: String,
}

impl PriceCacheEntry {
    /// Whether this row is younger than `ttl`.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        Utc::now() - self.fetched_at < ttl
    }

    /// Convert to a caller-facing quote. The quote timestamp is the fetch
    /// time of the row, so stale fallbacks are honest about their age.
    #[must_use]
    pub fn to_quote(&self, cached: bool) -> Quote {
        Quote {
            symbol: self.symbol.clone(),
            price: self.price,
            timestamp: self.fetched_at,
            cached,
        }
    }
}
