//! Registry of named circuits and the breaker-guarded call wrapper.
//!
//! The registry is owned by the application and injected into services, so
//! tests can instantiate isolated registries instead of sharing an ambient
//! global.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::resilience::breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot};

/// Well-known circuit names. One circuit per failure domain: a degraded
/// order-placement endpoint must not block market-data reads.
pub mod circuits {
    pub const MARKET_DATA: &str = "market_data";
    pub const TRADING: &str = "trading";
    pub const ACCOUNT: &str = "account";
}

/// Lazily populated map of circuit name to breaker. All circuits in one
/// registry share the same tuning.
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    circuits: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            circuits: DashMap::new(),
        }
    }

    /// Get or create the breaker for `name`.
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        self.circuits
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config.clone())))
            .clone()
    }

    /// Run `operation` under the named circuit.
    ///
    /// Rejected calls return [`Error::CircuitOpen`] without invoking the
    /// operation. Any `Err` from the operation counts as a circuit failure;
    /// the error itself is passed through unchanged.
    pub async fn with_circuit_breaker<T, Fut>(
        &self,
        name: &str,
        operation: impl FnOnce() -> Fut,
    ) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let breaker = self.breaker(name);
        let Some(admission) = breaker.admit() else {
            debug!(circuit = name, "rejecting call, circuit open");
            return Err(Error::CircuitOpen {
                circuit: name.to_string(),
            });
        };

        match operation().await {
            Ok(value) => {
                breaker.record_success(admission);
                Ok(value)
            }
            Err(err) => {
                breaker.record_failure(admission);
                Err(err)
            }
        }
    }

    /// Snapshot of one circuit, or `None` if it has never been used.
    #[must_use]
    pub fn circuit_state(&self, name: &str) -> Option<CircuitSnapshot> {
        self.circuits.get(name).map(|entry| entry.snapshot())
    }

    /// Snapshots of all known circuits, sorted by name.
    #[must_use]
    pub fn circuit_states(&self) -> Vec<CircuitSnapshot> {
        let mut states: Vec<CircuitSnapshot> = self
            .circuits
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }
}
