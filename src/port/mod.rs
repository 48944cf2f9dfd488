//! Ports: the trait seams between the quote service and the outside world.
//!
//! Concrete implementations live under `adapter/`; test fakes live in
//! `testkit`.

pub mod provider;
pub mod store;

pub use provider::{LatestTrade, MarketDataProvider};
pub use store::QuoteStore;
