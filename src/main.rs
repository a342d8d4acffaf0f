//! checkd binary entry point.
//!
//! Registers the built-in checkers, runs the init/run lifecycle, and serves
//! the metrics exposition endpoint. Core functionality is provided by the
//! `checkd` library crate.

use std::sync::Arc;

use checkd::{
    AppConfig, LifecycleManager, MetricRegistry,
    checks::{ClockChecker, HeartbeatChecker},
    server::{AppState, serve},
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// checkd - recurring-check scheduler with a prometheus endpoint
#[derive(Parser, Debug)]
#[command(name = "checkd", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml", env = "CHECKD_CONFIG")]
    config: String,

    /// Metrics listener port (overrides config file)
    #[arg(long, env = "CHECKD_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,checkd=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!(path = %cli.config, "loading configuration");
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let addr = config.listen_addr()?;

    let metrics = MetricRegistry::new();
    let manager = Arc::new(LifecycleManager::new());
    manager.register(Arc::new(ClockChecker::new(metrics.clone())));
    manager.register(Arc::new(HeartbeatChecker::new(metrics.clone())));

    // Startup init failure is fatal; reload failures later are not.
    manager.init_all(&config)?;
    manager.run_all();

    #[cfg(unix)]
    spawn_reload_task(Arc::clone(&manager), cli.config.clone());

    serve(addr, AppState { metrics }).await?;
    Ok(())
}

/// Re-run the init pass over all checkers when SIGHUP arrives.
///
/// The configuration file is re-read on each signal; a failed reload keeps
/// the previous initialization and the already-running check loops.
#[cfg(unix)]
fn spawn_reload_task(manager: Arc<LifecycleManager>, config_path: String) {
    tokio::spawn(async move {
        let mut hangup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
        {
            Ok(signal) => signal,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGHUP handler");
                return;
            }
        };

        while hangup.recv().await.is_some() {
            tracing::info!("config reload requested");
            match AppConfig::load(&config_path) {
                Ok(config) => {
                    if let Err(e) = manager.init_all(&config) {
                        tracing::error!(checker = %e.name, error = %e, "re-init failed");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to reload config");
                }
            }
        }
    });
}
