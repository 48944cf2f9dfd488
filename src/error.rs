use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {var}")]
    MissingEnv { var: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors from the market-data provider.
///
/// Every variant counts as a circuit-breaker failure when it escapes a
/// breaker-guarded call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Errors from the price cache store.
///
/// Distinct from [`ProviderError`]: a broken cache also removes the
/// stale-fallback option, so callers must be able to tell the two apart.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache connection unavailable: {0}")]
    Connection(String),

    #[error("cache query failed: {0}")]
    Query(String),

    #[error("corrupt cache row: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum Error {
    /// The named circuit is open (or its half-open trial slot is taken).
    /// Not a generic fetch failure: the dependency is already known bad,
    /// callers should fall back to cache instead of retrying.
    #[error("circuit '{circuit}' is open")]
    CircuitOpen { circuit: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a circuit-breaker rejection.
    #[must_use]
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Error::CircuitOpen { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
