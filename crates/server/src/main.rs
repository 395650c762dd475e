mod bootstrap;
mod health;
mod ingress;
mod worker;

use std::time::Duration;

use anyhow::Result;
use askbot_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;

fn init_logging(config: &AppConfig) {
    use askbot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging must be up before bootstrap emits anything.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);

    let router = ingress::router(app.ingress).merge(health::router(app.queue.clone()));
    let listener = tokio::net::TcpListener::bind(&address).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut worker = tokio::spawn(app.worker.run(shutdown_rx));

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        bind_address = %address,
        events_path = ingress::EVENTS_PATH,
        "askbot-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        thread_id = "unknown",
        queued = app.queue.stats().queued,
        grace_secs = grace.as_secs(),
        "ingress stopped; draining work queue"
    );
    // Ignored: the worker may already have exited.
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(grace, &mut worker).await {
        Ok(Ok(summary)) => tracing::info!(
            event_name = "system.server.stopped",
            correlation_id = "shutdown",
            thread_id = "unknown",
            processed = summary.processed,
            failed = summary.failed,
            "askbot-server stopped cleanly"
        ),
        Ok(Err(error)) => tracing::error!(
            event_name = "system.server.worker_crashed",
            correlation_id = "shutdown",
            thread_id = "unknown",
            error = %error,
            "dispatch worker terminated abnormally"
        ),
        Err(_) => {
            worker.abort();
            let stats = app.queue.stats();
            tracing::warn!(
                event_name = "system.server.drain_abandoned",
                correlation_id = "shutdown",
                thread_id = "unknown",
                queued = stats.queued,
                in_flight = stats.in_flight,
                "graceful shutdown window elapsed; abandoning remaining work"
            );
        }
    }

    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(
                event_name = "system.server.signal_error",
                correlation_id = "shutdown",
                error = %error,
                "failed to listen for ctrl-c"
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
