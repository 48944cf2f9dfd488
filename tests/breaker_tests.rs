//! Circuit breaker lifecycle against the registry wrapper, including the
//! full trip / cooldown / trial / recovery sequence.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quotegate::error::ProviderError;
use quotegate::resilience::{
    circuits, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState,
};
use quotegate::Result;

fn registry(threshold: u32, reset: Duration) -> CircuitBreakerRegistry {
    CircuitBreakerRegistry::new(CircuitBreakerConfig {
        failure_threshold: threshold,
        reset_timeout: reset,
    })
}

fn provider_failure() -> quotegate::Error {
    ProviderError::Status {
        status: 502,
        message: "bad gateway".to_string(),
    }
    .into()
}

/// Three consecutive failures trip the circuit; the fourth call is rejected
/// without invoking the operation; after the cooldown the next call runs as
/// the trial and, on success, closes the circuit with counters reset.
///
/// Timing is scaled down from the production 30s cooldown.
#[tokio::test]
async fn trip_cooldown_trial_recovery_lifecycle() {
    let registry = registry(3, Duration::from_millis(200));
    let invocations = AtomicU32::new(0);

    for _ in 0..3 {
        let result: Result<()> = registry
            .with_circuit_breaker(circuits::MARKET_DATA, || async {
                invocations.fetch_add(1, Ordering::SeqCst);
                Err(provider_failure())
            })
            .await;
        assert!(!result.unwrap_err().is_circuit_open());
    }

    let snapshot = registry.circuit_state(circuits::MARKET_DATA).unwrap();
    assert_eq!(snapshot.state, CircuitState::Open);
    assert_eq!(snapshot.failures, 3);
    assert!(snapshot.last_failure_at.is_some());

    // Fourth call: rejected immediately, operation not invoked
    let result: Result<()> = registry
        .with_circuit_breaker(circuits::MARKET_DATA, || async {
            invocations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;
    assert!(result.unwrap_err().is_circuit_open());
    assert_eq!(invocations.load(Ordering::SeqCst), 3);

    // After the cooldown the next call is admitted as the trial
    tokio::time::sleep(Duration::from_millis(250)).await;
    let result = registry
        .with_circuit_breaker(circuits::MARKET_DATA, || async {
            invocations.fetch_add(1, Ordering::SeqCst);
            Ok("recovered")
        })
        .await;
    assert_eq!(result.unwrap(), "recovered");
    assert_eq!(invocations.load(Ordering::SeqCst), 4);

    let snapshot = registry.circuit_state(circuits::MARKET_DATA).unwrap();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.failures, 0);
}

#[tokio::test]
async fn failed_trial_reopens_with_a_fresh_cooldown() {
    let registry = registry(1, Duration::from_millis(150));

    let _: Result<()> = registry
        .with_circuit_breaker(circuits::MARKET_DATA, || async { Err(provider_failure()) })
        .await;

    tokio::time::sleep(Duration::from_millis(200)).await;

    // Trial fails: circuit reopens
    let _: Result<()> = registry
        .with_circuit_breaker(circuits::MARKET_DATA, || async { Err(provider_failure()) })
        .await;
    assert_eq!(
        registry.circuit_state(circuits::MARKET_DATA).unwrap().state,
        CircuitState::Open
    );

    // The cooldown restarted at the trial failure, so an immediate call is
    // still rejected
    let result: Result<()> = registry
        .with_circuit_breaker(circuits::MARKET_DATA, || async { Ok(()) })
        .await;
    assert!(result.unwrap_err().is_circuit_open());

    // A second full cooldown admits a new trial
    tokio::time::sleep(Duration::from_millis(200)).await;
    let result: Result<i32> = registry
        .with_circuit_breaker(circuits::MARKET_DATA, || async { Ok(7) })
        .await;
    assert_eq!(result.unwrap(), 7);
}

#[tokio::test]
async fn only_one_concurrent_caller_wins_the_trial_slot() {
    let registry = Arc::new(registry(1, Duration::from_millis(50)));

    let _: Result<()> = registry
        .with_circuit_breaker(circuits::MARKET_DATA, || async { Err(provider_failure()) })
        .await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    // Launch several callers at once; the trial holder sleeps so the others
    // arrive while the slot is taken
    let mut handles = Vec::new();
    for _ in 0..5 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            registry
                .with_circuit_breaker(circuits::MARKET_DATA, || async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(())
                })
                .await
        }));
    }

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => admitted += 1,
            Err(err) => {
                assert!(err.is_circuit_open());
                rejected += 1;
            }
        }
    }

    assert_eq!(admitted, 1, "exactly one trial call may run");
    assert_eq!(rejected, 4);
    assert_eq!(
        registry.circuit_state(circuits::MARKET_DATA).unwrap().state,
        CircuitState::Closed
    );
}

#[tokio::test]
async fn circuit_states_lists_every_circuit_touched() {
    let registry = registry(5, Duration::from_secs(30));

    let _: Result<()> = registry
        .with_circuit_breaker(circuits::MARKET_DATA, || async { Ok(()) })
        .await;
    let _: Result<()> = registry
        .with_circuit_breaker(circuits::TRADING, || async { Err(provider_failure()) })
        .await;
    let _: Result<()> = registry
        .with_circuit_breaker(circuits::ACCOUNT, || async { Ok(()) })
        .await;

    let states = registry.circuit_states();
    let names: Vec<&str> = states.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["account", "market_data", "trading"]);

    let trading = states.iter().find(|s| s.name == "trading").unwrap();
    assert_eq!(trading.failures, 1);
}
