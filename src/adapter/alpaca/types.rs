//! Wire types for the Alpaca data API.
//!
//! Every field is optional at the deserialization boundary: a malformed
//! per-symbol entry must become a dropped entry, never an abort of the
//! whole response.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::port::provider::LatestTrade;

/// A single trade as it appears in latest-trade and snapshot payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct TradePayload {
    #[serde(rename = "p")]
    pub price: Option<Decimal>,
    #[serde(rename = "t")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TradePayload {
    /// Convert to a validated trade. `None` when the price is missing; a
    /// missing timestamp falls back to the receive time.
    pub fn into_trade(self) -> Option<LatestTrade> {
        let price = self.price?;
        Some(LatestTrade {
            price,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

/// Response of `GET /v2/stocks/{symbol}/trades/latest`.
#[derive(Debug, Deserialize)]
pub struct LatestTradeResponse {
    pub trade: Option<TradePayload>,
}

/// Response of `GET /v2/stocks/trades/latest?symbols=...`.
///
/// Symbols the provider does not know are absent from `trades`.
#[derive(Debug, Deserialize)]
pub struct LatestTradesResponse {
    #[serde(default)]
    pub trades: HashMap<String, TradePayload>,
}

/// A daily bar inside a snapshot payload.
#[derive(Debug, Clone, Deserialize)]
pub struct BarPayload {
    #[serde(rename = "c")]
    pub close: Option<Decimal>,
    #[serde(rename = "h")]
    pub high: Option<Decimal>,
    #[serde(rename = "l")]
    pub low: Option<Decimal>,
    #[serde(rename = "v")]
    pub volume: Option<u64>,
}

/// Response of `GET /v2/stocks/{symbol}/snapshot`.
#[derive(Debug, Deserialize)]
pub struct SnapshotResponse {
    #[serde(rename = "latestTrade")]
    pub latest_trade: Option<TradePayload>,
    #[serde(rename = "dailyBar")]
    pub daily_bar: Option<BarPayload>,
    #[serde(rename = "prevDailyBar")]
    pub prev_daily_bar: Option<BarPayload>,
}
