//! Fan-out relay for time-tracking heartbeats.
//!
//! Heartbeat writes are mirrored to every configured backend and the
//! primary backend's response is relayed to the caller. Status reads only
//! go to the primary.

pub mod client;
pub mod config;
pub mod context;
pub mod errors;
pub mod fanout;
pub mod metrics_defs;
pub mod operation;
pub mod registry;
pub mod relay;
pub mod router;
pub mod service;

#[cfg(test)]
mod testutils;

use context::RelayContext;
use errors::RelayError;
use router::Router;
use service::RelayService;
use shared::http::run_http_service;
use std::sync::Arc;

pub async fn run(config: config::Config) -> Result<(), RelayError> {
    let context = RelayContext::new(&config)?;
    tracing::info!(
        backends = context.backends.count(),
        primary = %context.backends.primary().name,
        "Starting heartbeat relay"
    );

    let service = RelayService::new(Router::new(Arc::new(context)));
    run_http_service(&config.listener.host, config.listener.port, service).await
}
