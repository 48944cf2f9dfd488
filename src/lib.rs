//! Quotegate - Resilient market-data quote gateway.
//!
//! This crate mediates every call from an application to an external
//! real-time market-data provider: a per-dependency circuit breaker plus a
//! time-boxed, persisted price cache that degrades to stale data instead of
//! failing outright when the provider is down.
//!
//! # Architecture
//!
//! Lookups flow cache-first:
//!
//! ```text
//! caller → QuoteService → cache read → (stale/missing) → circuit breaker
//!        → provider fetch → cache upsert → envelope
//! ```
//!
//! On any fetch failure the service falls back to the cache row of any age,
//! bypassing the breaker. Every public quote operation returns a result
//! envelope; failure modes are data, never panics or raw errors.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with env-only provider credentials
//! - [`domain`] - Symbols, quotes, cache entries, result envelopes
//! - [`error`] - Error taxonomy for the crate
//! - [`port`] - Trait seams: `MarketDataProvider`, `QuoteStore`
//! - [`adapter`] - Alpaca REST provider, SQLite cache store
//! - [`resilience`] - Circuit breaker state machines and registry
//! - [`service`] - The quote service orchestration
//!
//! # Features
//!
//! - `testkit` - Scripted provider/store fakes for downstream tests
//!
//! # Example
//!
//! ```no_run
//! use quotegate::resilience::{circuits, CircuitBreakerConfig, CircuitBreakerRegistry};
//!
//! let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::default());
//! assert!(registry.circuit_state(circuits::MARKET_DATA).is_none());
//! ```

pub mod adapter;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
pub mod resilience;
pub mod service;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use error::{Error, Result};
pub use service::QuoteService;
