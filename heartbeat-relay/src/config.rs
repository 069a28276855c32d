use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("HTTP timeout cannot be 0 seconds")]
    InvalidTimeout,

    #[error(
        "no primary backend set - exactly one backend must be marked with is_primary = true"
    )]
    NoPrimary,

    #[error(
        "multiple primary backends found ({0}) - exactly one backend must be marked with is_primary = true"
    )]
    MultiplePrimaries(usize),
}

/// Relay configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for incoming time-tracking client requests
    #[serde(default)]
    pub listener: Listener,
    /// Enables debug-level diagnostic logging
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub timeouts: RelayTimeouts,
    /// Log secondary backend failures at warn level instead of debug
    #[serde(default)]
    pub report_secondary_failures: bool,
    /// Backends every heartbeat is mirrored to. Exactly one must be primary.
    pub backends: Vec<BackendConfig>,
}

impl Config {
    /// Validates the relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.timeouts.validate()?;

        match self.backends.iter().filter(|b| b.is_primary).count() {
            0 => Err(ValidationError::NoPrimary),
            1 => Ok(()),
            n => Err(ValidationError::MultiplePrimaries(n)),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on. 0 selects the default.
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match u16::deserialize(deserializer)? {
        0 => Ok(default_port()),
        port => Ok(port),
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RelayTimeouts {
    /// Bound on a single backend call, including reading the response body
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl Default for RelayTimeouts {
    fn default() -> Self {
        RelayTimeouts {
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl RelayTimeouts {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.http_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Backend service configuration
///
/// The URL is kept as a plain string: a malformed URL only surfaces as a
/// transport failure when that backend is called.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// Name used in logs and metrics
    pub name: String,
    /// Base URL of the backend, without the API path
    pub url: String,
    /// Credential sent as the Basic auth password
    pub api_key: String,
    #[serde(default)]
    pub is_primary: bool,
}
