//! Alpaca implementation of the [`MarketDataProvider`] port.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::adapter::alpaca::types::{LatestTradeResponse, LatestTradesResponse, SnapshotResponse};
use crate::config::{ProviderConfig, ProviderCredentials};
use crate::domain::{SnapshotQuote, Symbol};
use crate::error::{Error, ProviderError, Result};
use crate::port::provider::{LatestTrade, MarketDataProvider};

const KEY_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_HEADER: &str = "APCA-API-SECRET-KEY";

/// REST client for the Alpaca data API.
///
/// The underlying HTTP client carries a request timeout, so every fetch is
/// bounded; a timed-out call surfaces as a transport error and counts as a
/// circuit failure at the call site.
pub struct AlpacaMarketData {
    client: Client,
    base_url: Url,
}

impl AlpacaMarketData {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ProviderError::Transport)?;
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self { client, base_url })
    }

    fn authenticated(
        &self,
        request: RequestBuilder,
        credentials: &ProviderCredentials,
    ) -> RequestBuilder {
        request
            .header(KEY_HEADER, &credentials.key_id)
            .header(SECRET_HEADER, &credentials.secret_key)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        credentials: &ProviderCredentials,
    ) -> Result<T> {
        debug!(url = %url, "provider request");
        let response = self
            .authenticated(self.client.get(url), credentials)
            .send()
            .await
            .map_err(ProviderError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: truncate(&message),
            }
            .into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::from(ProviderError::Malformed(e.to_string())))
    }
}

/// Bound error messages so a large HTML error page does not end up in logs
/// and envelopes verbatim.
fn truncate(message: &str) -> String {
    const MAX: usize = 256;
    if message.len() <= MAX {
        message.to_string()
    } else {
        let mut end = MAX;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &message[..end])
    }
}

#[async_trait]
impl MarketDataProvider for AlpacaMarketData {
    async fn latest_trade(
        &self,
        symbol: &Symbol,
        credentials: &ProviderCredentials,
    ) -> Result<LatestTrade> {
        let url = self
            .base_url
            .join(&format!("v2/stocks/{symbol}/trades/latest"))?;
        let response: LatestTradeResponse = self.get_json(url, credentials).await?;

        response
            .trade
            .and_then(|t| t.into_trade())
            .ok_or_else(|| ProviderError::Malformed(format!("no trade for {symbol}")).into())
    }

    async fn latest_trades(
        &self,
        symbols: &[Symbol],
        credentials: &ProviderCredentials,
    ) -> Result<HashMap<Symbol, LatestTrade>> {
        let mut url = self.base_url.join("v2/stocks/trades/latest")?;
        let joined = symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        url.query_pairs_mut().append_pair("symbols", &joined);

        let response: LatestTradesResponse = self.get_json(url, credentials).await?;

        let mut trades = HashMap::with_capacity(response.trades.len());
        for (symbol, payload) in response.trades {
            match payload.into_trade() {
                Some(trade) => {
                    trades.insert(Symbol::new(&symbol), trade);
                }
                None => warn!(symbol = %symbol, "dropping malformed trade entry"),
            }
        }
        Ok(trades)
    }

    async fn latest_snapshot(
        &self,
        symbol: &Symbol,
        credentials: &ProviderCredentials,
    ) -> Result<SnapshotQuote> {
        let url = self.base_url.join(&format!("v2/stocks/{symbol}/snapshot"))?;
        let response: SnapshotResponse = self.get_json(url, credentials).await?;

        let trade = response
            .latest_trade
            .and_then(|t| t.into_trade())
            .ok_or_else(|| {
                Error::from(ProviderError::Malformed(format!(
                    "snapshot for {symbol} has no latest trade"
                )))
            })?;

        let previous_close = response.prev_daily_bar.as_ref().and_then(|b| b.close);
        let (change, change_percent) = match previous_close {
            Some(prev) if !prev.is_zero() => {
                let change = trade.price - prev;
                (Some(change), Some(change / prev * Decimal::ONE_HUNDRED))
            }
            _ => (None, None),
        };

        let daily = response.daily_bar.as_ref();
        Ok(SnapshotQuote {
            symbol: symbol.clone(),
            price: trade.price,
            timestamp: trade.timestamp,
            previous_close,
            change,
            change_percent,
            day_high: daily.and_then(|b| b.high),
            day_low: daily.and_then(|b| b.low),
            volume: daily.and_then(|b| b.volume),
        })
    }

    fn source(&self) -> &str {
        "alpaca"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let provider = AlpacaMarketData::new(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.source(), "alpaca");
    }

    #[test]
    fn rejects_invalid_base_url() {
        let config = ProviderConfig {
            base_url: "::not-a-url::".to_string(),
            ..ProviderConfig::default()
        };
        assert!(AlpacaMarketData::new(&config).is_err());
    }

    #[test]
    fn truncate_bounds_long_messages() {
        let long = "x".repeat(10_000);
        assert!(truncate(&long).len() < 300);
        assert_eq!(truncate("short"), "short");
    }
}
