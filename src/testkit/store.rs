//! In-memory and failing [`QuoteStore`] fakes.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::{PriceCacheEntry, Symbol};
use crate::error::{CacheError, Result};
use crate::port::store::QuoteStore;

/// HashMap-backed store for service tests that do not need SQLite.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<Symbol, PriceCacheEntry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row directly, bypassing the trait.
    pub fn insert(&self, entry: PriceCacheEntry) {
        self.rows.lock().unwrap().insert(entry.symbol.clone(), entry);
    }

    /// Number of rows currently held.
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QuoteStore for MemoryStore {
    async fn get(&self, symbol: &Symbol) -> Result<Option<PriceCacheEntry>> {
        Ok(self.rows.lock().unwrap().get(symbol).cloned())
    }

    async fn get_many(&self, symbols: &[Symbol]) -> Result<Vec<PriceCacheEntry>> {
        let rows = self.rows.lock().unwrap();
        Ok(symbols.iter().filter_map(|s| rows.get(s).cloned()).collect())
    }

    async fn upsert(&self, entry: &PriceCacheEntry) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(entry.symbol.clone(), entry.clone());
        Ok(())
    }

    async fn delete(&self, symbols: &[Symbol]) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        Ok(symbols.iter().filter(|s| rows.remove(s).is_some()).count())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, entry| entry.fetched_at >= cutoff);
        Ok(before - rows.len())
    }
}

/// Store whose every operation fails, for exercising the cache-unavailable
/// paths.
#[derive(Default)]
pub struct FailingStore;

impl FailingStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn unavailable() -> crate::error::Error {
        CacheError::Connection("injected store failure".to_string()).into()
    }
}

impl QuoteStore for FailingStore {
    async fn get(&self, _symbol: &Symbol) -> Result<Option<PriceCacheEntry>> {
        Err(Self::unavailable())
    }

    async fn get_many(&self, _symbols: &[Symbol]) -> Result<Vec<PriceCacheEntry>> {
        Err(Self::unavailable())
    }

    async fn upsert(&self, _entry: &PriceCacheEntry) -> Result<()> {
        Err(Self::unavailable())
    }

    async fn delete(&self, _symbols: &[Symbol]) -> Result<usize> {
        Err(Self::unavailable())
    }

    async fn purge_older_than(&self, _cutoff: DateTime<Utc>) -> Result<usize> {
        Err(Self::unavailable())
    }
}
