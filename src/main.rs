// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Photo-Trail API Server
//!
//! Receives location fixes from a device, collects a photo near each new
//! position from Flickr, and serves the resulting trip log.

use photo_trail::{config::Config, services::FlickrClient, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        dedup = ?config.trip.dedup,
        revisit = ?config.trip.revisit,
        photo_size = ?config.trip.photo_size,
        "Starting Photo-Trail API"
    );

    // One client serves both search and download
    let flickr = Arc::new(FlickrClient::new(config.flickr.clone()));
    tracing::info!(api_url = %config.flickr.api_url, "Flickr client initialized");

    let state = Arc::new(AppState::new(config.clone(), flickr.clone(), flickr));

    let app = photo_trail::routes::create_router(state.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let photos that are already downloading land in the log before exit
    state.orchestrator.stop_tracking().await;
    state.orchestrator.drain_pipelines().await;
    let entries = state.orchestrator.entry_count().await;
    tracing::info!(entries, "Server stopped");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("photo_trail=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
