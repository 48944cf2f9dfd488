//! Market-data provider port.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::ProviderCredentials;
use crate::domain::{SnapshotQuote, Symbol};
use crate::error::Result;

/// The latest trade for a symbol as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestTrade {
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Upstream source of real-time prices.
///
/// Implementations must be thread-safe; every call must be bounded by a
/// request timeout so a hung provider surfaces as an error instead of
/// occupying a circuit's trial slot forever.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest trade for a single symbol. An unknown symbol is an error on
    /// this endpoint.
    async fn latest_trade(
        &self,
        symbol: &Symbol,
        credentials: &ProviderCredentials,
    ) -> Result<LatestTrade>;

    /// Latest trades for a set of symbols in one round trip.
    ///
    /// Symbols the provider does not know are simply absent from the map;
    /// that is the caller's signal to report them as failed without counting
    /// a dependency failure.
    async fn latest_trades(
        &self,
        symbols: &[Symbol],
        credentials: &ProviderCredentials,
    ) -> Result<HashMap<Symbol, LatestTrade>>;

    /// Extended snapshot for a single symbol: latest trade plus daily
    /// context.
    async fn latest_snapshot(
        &self,
        symbol: &Symbol,
        credentials: &ProviderCredentials,
    ) -> Result<SnapshotQuote>;

    /// Tag recorded in cache rows written from this provider's data.
    fn source(&self) -> &str;
}
