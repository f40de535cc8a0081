// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Follow-Train API Server
//!
//! Stores trains of linked social profiles and proxies profile lookups
//! to the social platforms.

use follow_train::{config::Config, db::TrainDb, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        store = ?config.store_backend,
        "Starting Follow-Train API"
    );

    // Initialize the train store
    let db = TrainDb::connect(&config).await?;

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db)?);

    // Build router
    let app = follow_train::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("follow_train=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
