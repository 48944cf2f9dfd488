//! Quote service: cache-first price lookups with breaker-guarded fetches
//! and stale fallback.
//!
//! The service never returns `Err` to callers for quote operations; every
//! failure mode is data in the envelope. Maintenance operations return
//! `Result` since their only caller is a scheduled job.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, ProviderCredentials};
use crate::domain::{
    FailureKind, PriceCacheEntry, Quote, QuoteEnvelope, QuotesEnvelope, SnapshotEnvelope, Symbol,
};
use crate::error::Result;
use crate::port::provider::{LatestTrade, MarketDataProvider};
use crate::port::store::QuoteStore;
use crate::resilience::{circuits, CircuitBreakerRegistry, CircuitSnapshot};

/// Upper bound on one batched lookup; the provider rejects larger requests.
pub const MAX_BATCH_SYMBOLS: usize = 100;

/// Orchestrates cache reads, breaker-guarded provider fetches, and
/// stale-fallback for price lookups.
pub struct QuoteService<P, S> {
    provider: Arc<P>,
    store: Arc<S>,
    breakers: Arc<CircuitBreakerRegistry>,
    cache: CacheConfig,
}

impl<P, S> QuoteService<P, S>
where
    P: MarketDataProvider,
    S: QuoteStore,
{
    pub fn new(
        provider: Arc<P>,
        store: Arc<S>,
        breakers: Arc<CircuitBreakerRegistry>,
        cache: CacheConfig,
    ) -> Self {
        Self {
            provider,
            store,
            breakers,
            cache,
        }
    }

    /// Current price for one symbol.
    ///
    /// Serves the cache row when fresher than the TTL; otherwise fetches
    /// through the `market_data` circuit. On any fetch failure an existing
    /// row of any age is served instead; with no row, the envelope reports
    /// whether the dependency was known bad or the fetch itself failed.
    pub async fn get_quote(
        &self,
        symbol: &str,
        credentials: &ProviderCredentials,
    ) -> QuoteEnvelope {
        let symbol = Symbol::new(symbol);
        if symbol.is_empty() {
            return QuoteEnvelope::failure(FailureKind::FetchFailed, "empty symbol");
        }

        let cached = match self.store.get(&symbol).await {
            Ok(row) => row,
            Err(err) => {
                warn!(symbol = %symbol, error = %err, "cache read failed");
                return QuoteEnvelope::failure(FailureKind::CacheUnavailable, err.to_string());
            }
        };

        if let Some(entry) = &cached {
            if entry.is_fresh(self.cache.ttl()) {
                debug!(symbol = %symbol, "cache hit");
                return QuoteEnvelope::ok(entry.to_quote(true));
            }
        }

        let fetched = self
            .breakers
            .with_circuit_breaker(circuits::MARKET_DATA, || async {
                self.provider.latest_trade(&symbol, credentials).await
            })
            .await;

        match fetched {
            Ok(trade) => QuoteEnvelope::ok(self.cache_trade(&symbol, &trade).await),
            Err(err) => match cached {
                Some(entry) => {
                    info!(symbol = %symbol, error = %err, "serving stale quote");
                    QuoteEnvelope::ok(entry.to_quote(true))
                }
                None => QuoteEnvelope::failure(FailureKind::from(&err), err.to_string()),
            },
        }
    }

    /// Current prices for up to [`MAX_BATCH_SYMBOLS`] symbols.
    ///
    /// One bulk cache read partitions the set; one batched provider call
    /// covers everything that needs fetching. A symbol the provider does
    /// not return goes to `failed` without counting as a dependency
    /// failure. If the batched call itself fails, each needs-fetch symbol
    /// falls back to its cache row of any age. No single symbol's problem
    /// aborts the batch.
    pub async fn get_quotes(
        &self,
        symbols: &[String],
        credentials: &ProviderCredentials,
    ) -> QuotesEnvelope {
        let mut failed: Vec<Symbol> = Vec::new();
        let mut requested: Vec<Symbol> = Vec::new();
        let mut seen: HashSet<Symbol> = HashSet::new();
        for raw in symbols {
            let symbol = Symbol::new(raw);
            if symbol.is_empty() {
                continue;
            }
            if seen.insert(symbol.clone()) {
                requested.push(symbol);
            }
        }
        if requested.len() > MAX_BATCH_SYMBOLS {
            warn!(
                requested = requested.len(),
                limit = MAX_BATCH_SYMBOLS,
                "batch too large, truncating"
            );
            failed.extend(requested.split_off(MAX_BATCH_SYMBOLS));
        }

        let rows = match self.store.get_many(&requested).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "bulk cache read failed");
                return QuotesEnvelope::failure(FailureKind::CacheUnavailable, err.to_string());
            }
        };
        let by_symbol: HashMap<Symbol, PriceCacheEntry> = rows
            .into_iter()
            .map(|entry| (entry.symbol.clone(), entry))
            .collect();

        let mut quotes: Vec<Quote> = Vec::with_capacity(requested.len());
        let mut needs_fetch: Vec<Symbol> = Vec::new();
        for symbol in &requested {
            match by_symbol.get(symbol) {
                Some(entry) if entry.is_fresh(self.cache.ttl()) => {
                    quotes.push(entry.to_quote(true));
                }
                _ => needs_fetch.push(symbol.clone()),
            }
        }

        if needs_fetch.is_empty() {
            return QuotesEnvelope::ok(quotes, failed);
        }

        let fetched = self
            .breakers
            .with_circuit_breaker(circuits::MARKET_DATA, || async {
                self.provider.latest_trades(&needs_fetch, credentials).await
            })
            .await;

        match fetched {
            Ok(trades) => {
                for symbol in &needs_fetch {
                    match trades.get(symbol) {
                        Some(trade) => {
                            quotes.push(self.cache_trade(symbol, trade).await);
                        }
                        // Absent from a 2xx response: unknown ticker, a
                        // client-input problem rather than dependency health
                        None => failed.push(symbol.clone()),
                    }
                }
            }
            Err(err) => {
                info!(error = %err, count = needs_fetch.len(), "batched fetch failed, falling back to cache");
                for symbol in &needs_fetch {
                    match by_symbol.get(symbol) {
                        Some(entry) => quotes.push(entry.to_quote(true)),
                        None => failed.push(symbol.clone()),
                    }
                }
            }
        }

        QuotesEnvelope::ok(quotes, failed)
    }

    /// Extended snapshot for one symbol, always a live read through the
    /// circuit. Snapshots are never cached and have no stale fallback.
    pub async fn get_snapshot(
        &self,
        symbol: &str,
        credentials: &ProviderCredentials,
    ) -> SnapshotEnvelope {
        let symbol = Symbol::new(symbol);
        if symbol.is_empty() {
            return SnapshotEnvelope::failure(FailureKind::FetchFailed, "empty symbol");
        }

        let fetched = self
            .breakers
            .with_circuit_breaker(circuits::MARKET_DATA, || async {
                self.provider.latest_snapshot(&symbol, credentials).await
            })
            .await;

        match fetched {
            Ok(snapshot) => SnapshotEnvelope::ok(snapshot),
            Err(err) => SnapshotEnvelope::failure(FailureKind::from(&err), err.to_string()),
        }
    }

    /// Delete rows older than twice the TTL. Returns the count removed.
    /// Bounds how stale a stale-fallback answer can ever be.
    pub async fn purge_stale_cache(&self) -> Result<usize> {
        let cutoff = Utc::now() - self.cache.purge_age();
        let purged = self.store.purge_older_than(cutoff).await?;
        if purged > 0 {
            info!(purged, "purged stale cache rows");
        }
        Ok(purged)
    }

    /// Drop rows for the given symbols immediately, forcing the next read
    /// to refetch. Returns the count removed.
    pub async fn invalidate_cache(&self, symbols: &[String]) -> Result<usize> {
        let symbols: Vec<Symbol> = symbols
            .iter()
            .map(|raw| Symbol::new(raw))
            .filter(|s| !s.is_empty())
            .collect();
        let removed = self.store.delete(&symbols).await?;
        debug!(removed, "invalidated cache rows");
        Ok(removed)
    }

    /// Read-only view of one circuit, for health checks.
    #[must_use]
    pub fn circuit_state(&self, name: &str) -> Option<CircuitSnapshot> {
        self.breakers.circuit_state(name)
    }

    /// Read-only view of all circuits.
    #[must_use]
    pub fn circuit_states(&self) -> Vec<CircuitSnapshot> {
        self.breakers.circuit_states()
    }

    /// Upsert a fetched trade and return it as a fresh quote. A failed
    /// write is logged and swallowed: the caller still gets the price.
    async fn cache_trade(&self, symbol: &Symbol, trade: &LatestTrade) -> Quote {
        let entry = PriceCacheEntry {
            symbol: symbol.clone(),
            price: trade.price,
            fetched_at: Utc::now(),
            source: self.provider.source().to_string(),
        };
        if let Err(err) = self.store.upsert(&entry).await {
            warn!(symbol = %symbol, error = %err, "failed to cache fetched price");
        }
        Quote {
            symbol: symbol.clone(),
            price: trade.price,
            timestamp: trade.timestamp,
            cached: false,
        }
    }
}
