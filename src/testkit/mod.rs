//! Test fakes for the provider and store ports.
//!
//! Enabled in unit tests and behind the `testkit` feature for integration
//! tests and downstream crates.

pub mod provider;
pub mod store;

pub use provider::ScriptedProvider;
pub use store::{FailingStore, MemoryStore};

use crate::config::ProviderCredentials;

/// Dummy credentials for tests; fakes never look at them.
#[must_use]
pub fn test_credentials() -> ProviderCredentials {
    ProviderCredentials {
        key_id: "test-key".to_string(),
        secret_key: "test-secret".to_string(),
    }
}
