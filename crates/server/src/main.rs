mod appointments;
mod bootstrap;
mod health;
mod products;
mod respond;

use std::time::Duration;

use anyhow::Result;
use axum::Router;

use treadline_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use treadline_core::config::LogFormat::*;

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
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config)?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        health::HealthState { price_book: app.price_book.clone(), bookings: app.bookings.clone() },
    )
    .await?;

    tracing::info!(
        event_name = "system.server.notify_channel",
        correlation_id = "bootstrap",
        channel = app.notifier.channel_name(),
        "notification channel initialized"
    );

    let router = Router::new()
        .merge(products::router(products::ProductsState {
            price_book: app.price_book.clone(),
            price_source: app.price_source.clone(),
        }))
        .merge(appointments::router(appointments::AppointmentsState {
            bookings: app.bookings.clone(),
            notifier: app.notifier.clone(),
        }));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "treadline-server started"
    );

    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown = async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = signal_tx.send(());
    };
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router).with_graceful_shutdown(shutdown).await
    });

    tokio::select! {
        joined = &mut server => joined??,
        _ = signal_rx => {
            tracing::info!(
                event_name = "system.server.stopping",
                correlation_id = "shutdown",
                grace_secs = app.config.server.graceful_shutdown_secs,
                "shutdown signal received, draining connections"
            );

            // Give in-flight requests the configured grace window, then exit anyway.
            let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
            match tokio::time::timeout(grace, &mut server).await {
                Ok(joined) => joined??,
                Err(_) => {
                    server.abort();
                    tracing::warn!(
                        event_name = "system.server.drain_timeout",
                        correlation_id = "shutdown",
                        "drain window elapsed with connections still open"
                    );
                }
            }
        }
    }

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "treadline-server stopped"
    );

    Ok(())
}
