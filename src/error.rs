//! Error types for configuration, provider calls, persistence, and activation.

use thiserror::Error;

/// Invalid or incomplete configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{key}` (set it in config.toml or the {env} environment variable)")]
    MissingSetting { key: &'static str, env: &'static str },

    #[error("`{key}` must be greater than zero")]
    ZeroCapacity { key: &'static str },

    #[error("`{key}` must not be empty")]
    EmptySetting { key: &'static str },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A failed call to the auth provider or identity backend.
///
/// The gate treats every variant as transient: the current invocation is
/// blocked and nothing is cached.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("provider returned {stat}: {message}")]
    Status { stat: String, message: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport(e.to_string())
    }
}

/// Failure reading or writing the filtered-command store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store contents at {path} are not valid: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Activation refused. The only failure class that is fatal to the process.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unable to connect to Duo api with credentials: {0}")]
    Credentials(#[source] ProviderError),

    #[error("unable to build http client: {0}")]
    Client(#[source] ProviderError),
}
