use crate::config::{LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("invalid sentry DSN: {0}")]
    InvalidDsn(#[from] sentry::types::ParseDsnError),
    #[error("could not build statsd exporter: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderAlreadySet,
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the debug flag.
pub fn init_tracing(debug: bool, with_sentry: bool) {
    let default_directives = if debug {
        "info,multitime=debug,heartbeat_relay=debug,shared=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(with_sentry.then(sentry::integrations::tracing::layer))
        .init();
}

/// Starts error reporting. The returned guard flushes pending events on drop.
pub fn init_sentry(
    config: Option<&LoggingConfig>,
) -> Result<Option<sentry::ClientInitGuard>, TelemetryError> {
    let Some(config) = config else {
        return Ok(None);
    };

    let dsn: sentry::types::Dsn = config.sentry_dsn.parse()?;
    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        ..Default::default()
    });
    Ok(Some(guard))
}

/// Sends metrics to StatsD when configured; otherwise metrics stay no-ops.
pub fn init_metrics(config: Option<&MetricsConfig>) -> Result<(), TelemetryError> {
    let Some(config) = config else {
        return Ok(());
    };

    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(config.prefix.as_str()))?;
    metrics::set_global_recorder(recorder).map_err(|_| TelemetryError::RecorderAlreadySet)?;
    shared::metrics_defs::describe_all(heartbeat_relay::metrics_defs::ALL_METRICS);

    Ok(())
}
