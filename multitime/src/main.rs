mod config;
mod telemetry;

use clap::Parser;
use config::Config;
use std::path::PathBuf;
use std::process;

/// Mirrors time-tracking heartbeats to several backends and answers with the primary's response.
#[derive(Parser)]
#[command(name = "multitime", version)]
struct Cli {
    /// Path to the YAML config file
    config: PathBuf,

    /// Log at debug level regardless of the config file
    #[arg(long)]
    debug: bool,

    /// Validate the config file and exit
    #[arg(long)]
    check: bool,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    if cli.check {
        let primary = config
            .relay
            .backends
            .iter()
            .find(|b| b.is_primary)
            .map_or("", |b| b.name.as_str());
        println!(
            "Config OK: {} backends, primary {primary}",
            config.relay.backends.len()
        );
        return;
    }

    // Sentry has to be initialized before the runtime starts
    let sentry_guard = match telemetry::init_sentry(config.common.logging.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing error reporting: {e}");
            process::exit(1);
        }
    };
    telemetry::init_tracing(cli.debug || config.relay.debug, sentry_guard.is_some());

    if let Err(e) = telemetry::init_metrics(config.common.metrics.as_ref()) {
        tracing::error!("Error initializing metrics: {e}");
        process::exit(1);
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Error starting runtime: {e}");
            process::exit(1);
        }
    };

    tracing::info!(port = config.relay.listener.port, "Starting multitime");
    if let Err(e) = rt.block_on(heartbeat_relay::run(config.relay)) {
        tracing::error!("Relay error: {e}");
        process::exit(1);
    }
}
