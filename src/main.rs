// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quakewatch API Server
//!
//! Serves per-recipient alert threshold configuration, the normalized
//! earthquake feed, drill injection, and the SMS fan-out trigger.

use quakewatch::{
    config::Config,
    db::FirestoreDb,
    services::{FanoutNotifier, FeedClient, Gazetteer, SmsGateClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Quakewatch API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Load the place gazetteer
    tracing::info!(path = %config.gazetteer_path, "Loading gazetteer");
    let gazetteer =
        Gazetteer::load_from_file(&config.gazetteer_path).expect("Failed to load gazetteer");
    tracing::info!(count = gazetteer.len(), "Gazetteer loaded");

    // Initialize the upstream feed client
    let feed = FeedClient::new(config.feed_base_url.clone());

    // Initialize the SMS fan-out channel
    if config.sms_api_username.is_empty() {
        tracing::warn!("SMS_API_USERNAME not set; SMS delivery will fail until configured");
    }
    let sms = SmsGateClient::new(
        config.sms_api_url.clone(),
        config.sms_api_username.clone(),
        config.sms_api_password.clone(),
    );
    let notifier = FanoutNotifier::new(sms);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        gazetteer,
        feed,
        notifier,
    });

    // Build router
    let app = quakewatch::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quakewatch=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
