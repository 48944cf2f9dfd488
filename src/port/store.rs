//! Price cache store port.
//!
//! One row per symbol with upsert-on-conflict semantics. The store holds no
//! freshness policy of its own; TTL decisions belong to the quote service.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::domain::{PriceCacheEntry, Symbol};
use crate::error::Result;

/// Persistence operations for cached prices.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `upsert` must be atomic per symbol (no read-modify-write race)
/// - `purge_older_than` should be called periodically to bound staleness
pub trait QuoteStore: Send + Sync {
    /// Get the cache row for a symbol, if any.
    fn get(
        &self,
        symbol: &Symbol,
    ) -> impl Future<Output = Result<Option<PriceCacheEntry>>> + Send;

    /// Get all existing rows for the given symbols in one read.
    fn get_many(
        &self,
        symbols: &[Symbol],
    ) -> impl Future<Output = Result<Vec<PriceCacheEntry>>> + Send;

    /// Insert or overwrite the row for the entry's symbol.
    fn upsert(&self, entry: &PriceCacheEntry) -> impl Future<Output = Result<()>> + Send;

    /// Delete rows for the given symbols. Returns the count deleted.
    fn delete(&self, symbols: &[Symbol]) -> impl Future<Output = Result<usize>> + Send;

    /// Delete rows fetched before `cutoff`. Returns the count deleted.
    fn purge_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<usize>> + Send;
}
