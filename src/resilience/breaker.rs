//! Per-circuit state machine.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: one trial call probes recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures reach the threshold
//! Open → Half-Open: reset timeout elapsed, claimed atomically with the trial slot
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails, timeout restarts from now
//! ```
//!
//! All mutation happens under one mutex per circuit, so two callers racing
//! into Half-Open cannot both claim the trial slot.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

/// State of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("CLOSED"),
            CircuitState::Open => f.write_str("OPEN"),
            CircuitState::HalfOpen => f.write_str("HALF_OPEN"),
        }
    }
}

/// Tuning for a circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the circuit open.
    pub failure_threshold: u32,
    /// Cooldown before an open circuit admits a trial call.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

/// Read-only view of a circuit, for health checks and metrics exporters.
/// Taking a snapshot never mutates the circuit and never makes a live call.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failures: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// Proof that a call was admitted, returned by [`CircuitBreaker::admit`].
/// The holder must resolve it with exactly one of `record_success` or
/// `record_failure`.
#[derive(Debug, Clone, Copy)]
#[must_use = "resolve the admission with record_success or record_failure"]
pub enum Admission {
    /// Admitted through a closed circuit.
    Closed,
    /// This caller holds the single half-open trial slot.
    Trial,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<DateTime<Utc>>,
    last_transition_at: Instant,
    trial_in_flight: bool,
}

impl Inner {
    fn transition(&mut self, state: CircuitState) {
        self.state = state;
        self.last_transition_at = Instant::now();
    }
}

/// A single named circuit. Created lazily by the registry on first use and
/// shared across all concurrent callers.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure_at: None,
                last_transition_at: Instant::now(),
                trial_in_flight: false,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decide whether a call may proceed.
    ///
    /// Returns `None` when the circuit is open and the cooldown has not
    /// elapsed, or when another caller already holds the half-open trial
    /// slot. The open-to-half-open transition and the trial claim happen as
    /// one step under the lock.
    pub fn admit(&self) -> Option<Admission> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Some(Admission::Closed),
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    None
                } else {
                    inner.trial_in_flight = true;
                    Some(Admission::Trial)
                }
            }
            CircuitState::Open => {
                if inner.last_transition_at.elapsed() >= self.config.reset_timeout {
                    inner.transition(CircuitState::HalfOpen);
                    inner.trial_in_flight = true;
                    info!(circuit = %self.name, "cooldown elapsed, admitting trial call");
                    Some(Admission::Trial)
                } else {
                    None
                }
            }
        }
    }

    /// Record a successful call.
    pub fn record_success(&self, admission: Admission) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
        if matches!(admission, Admission::Trial) {
            inner.trial_in_flight = false;
            inner.transition(CircuitState::Closed);
            info!(circuit = %self.name, "trial call succeeded, circuit closed");
        }
    }

    /// Record a failed call. A failed trial reopens the circuit and restarts
    /// the cooldown from now.
    pub fn record_failure(&self, admission: Admission) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_failure_at = Some(Utc::now());
        match admission {
            Admission::Trial => {
                inner.trial_in_flight = false;
                inner.transition(CircuitState::Open);
                warn!(circuit = %self.name, "trial call failed, circuit reopened");
            }
            Admission::Closed => {
                if inner.state == CircuitState::Closed
                    && inner.consecutive_failures >= self.config.failure_threshold
                {
                    inner.transition(CircuitState::Open);
                    warn!(
                        circuit = %self.name,
                        failures = inner.consecutive_failures,
                        "failure threshold reached, circuit opened"
                    );
                }
            }
        }
    }

    /// Current state without mutating the circuit.
    #[must_use]
    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.lock();
        CircuitSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failures: inner.consecutive_failures,
            last_failure_at: inner.last_failure_at,
        }
    }

    /// Force the circuit back to closed, clearing counters.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
        inner.last_failure_at = None;
        inner.trial_in_flight = false;
        inner.transition(CircuitState::Closed);
    }
}
