//! Scripted [`MarketDataProvider`] fake.
//!
//! Each call pops the next scripted result from the corresponding queue.
//! An exhausted queue yields an error, so a test that under-scripts fails
//! loudly instead of silently succeeding.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::ProviderCredentials;
use crate::domain::{SnapshotQuote, Symbol};
use crate::error::{ProviderError, Result};
use crate::port::provider::{LatestTrade, MarketDataProvider};

#[derive(Default)]
pub struct ScriptedProvider {
    single: Mutex<VecDeque<Result<LatestTrade>>>,
    batch: Mutex<VecDeque<Result<HashMap<Symbol, LatestTrade>>>>,
    snapshots: Mutex<VecDeque<Result<SnapshotQuote>>>,
    single_calls: AtomicU32,
    batch_calls: AtomicU32,
    snapshot_calls: AtomicU32,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_trades(self, results: Vec<Result<LatestTrade>>) -> Self {
        *self.single.lock().unwrap() = results.into();
        self
    }

    #[must_use]
    pub fn with_batches(self, results: Vec<Result<HashMap<Symbol, LatestTrade>>>) -> Self {
        *self.batch.lock().unwrap() = results.into();
        self
    }

    #[must_use]
    pub fn with_snapshots(self, results: Vec<Result<SnapshotQuote>>) -> Self {
        *self.snapshots.lock().unwrap() = results.into();
        self
    }

    /// Number of single-trade calls made so far.
    pub fn single_calls(&self) -> u32 {
        self.single_calls.load(Ordering::SeqCst)
    }

    /// Number of batched calls made so far.
    pub fn batch_calls(&self) -> u32 {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Number of snapshot calls made so far.
    pub fn snapshot_calls(&self) -> u32 {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    fn exhausted() -> crate::error::Error {
        ProviderError::Malformed("scripted provider exhausted".to_string()).into()
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn latest_trade(
        &self,
        _symbol: &Symbol,
        _credentials: &ProviderCredentials,
    ) -> Result<LatestTrade> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.single
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }

    async fn latest_trades(
        &self,
        _symbols: &[Symbol],
        _credentials: &ProviderCredentials,
    ) -> Result<HashMap<Symbol, LatestTrade>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.batch
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }

    async fn latest_snapshot(
        &self,
        _symbol: &Symbol,
        _credentials: &ProviderCredentials,
    ) -> Result<SnapshotQuote> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }

    fn source(&self) -> &str {
        "scripted"
    }
}
