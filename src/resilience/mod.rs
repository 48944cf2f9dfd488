//! Circuit breaking for external dependencies.
//!
//! Each named circuit isolates one failure domain (market data, trading,
//! account) so a degraded dependency cannot block calls to a healthy one.
//! State lives in process memory only; a restart resets every circuit to
//! closed.

pub mod breaker;
pub mod registry;

pub use breaker::{Admission, CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState};
pub use registry::{circuits, CircuitBreakerRegistry};
