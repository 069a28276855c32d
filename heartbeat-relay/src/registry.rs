//! Backend registry
//!
//! Immutable, ordered list of the backends every write is mirrored to, with
//! direct access to the single primary backend whose response is relayed to
//! the caller.
//!
//! The registry is built once at startup and shared read-only between all
//! in-flight requests.

use std::sync::Arc;

use crate::config::{BackendConfig, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backend {
    /// Name used only in logs and metrics
    pub name: String,
    pub base_url: String,
    pub credential: String,
    pub is_primary: bool,
}

impl From<BackendConfig> for Backend {
    fn from(config: BackendConfig) -> Self {
        Self {
            name: config.name,
            base_url: config.url,
            credential: config.api_key,
            is_primary: config.is_primary,
        }
    }
}

impl Backend {
    pub fn role(&self) -> &'static str {
        if self.is_primary { "primary" } else { "secondary" }
    }
}

#[derive(Debug)]
struct BackendsInner {
    backends: Vec<Backend>,
    primary: usize,
}

#[derive(Clone, Debug)]
pub struct Backends {
    inner: Arc<BackendsInner>,
}

impl Backends {
    /// Builds the registry, failing unless exactly one backend is primary.
    pub fn try_new(configs: Vec<BackendConfig>) -> Result<Self, ValidationError> {
        let backends: Vec<Backend> = configs.into_iter().map(Backend::from).collect();

        let mut primaries = backends
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_primary)
            .map(|(index, _)| index);

        let primary = primaries.next().ok_or(ValidationError::NoPrimary)?;
        let extra = primaries.count();
        if extra > 0 {
            return Err(ValidationError::MultiplePrimaries(extra + 1));
        }

        Ok(Self {
            inner: Arc::new(BackendsInner { backends, primary }),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        self.inner.backends.iter()
    }

    pub fn primary(&self) -> &Backend {
        &self.inner.backends[self.inner.primary]
    }

    /// Number of backends. Never zero, since the primary is always present.
    pub fn count(&self) -> usize {
        self.inner.backends.len()
    }
}
