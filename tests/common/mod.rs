// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use quakewatch::config::Config;
use quakewatch::db::FirestoreDb;
use quakewatch::routes::create_router;
use quakewatch::services::{FanoutNotifier, FeedClient, Gazetteer, SmsGateClient};
use quakewatch::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Load the repository gazetteer for tests.
#[allow(dead_code)]
pub fn test_gazetteer() -> Gazetteer {
    Gazetteer::load_from_file("data/gazetteer.geojson")
        .expect("Failed to load gazetteer - is data/ committed?")
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db_offline();
    let gazetteer = test_gazetteer();
    let feed = FeedClient::new(config.feed_base_url.clone());
    let notifier = FanoutNotifier::new(SmsGateClient::new(
        config.sms_api_url.clone(),
        config.sms_api_username.clone(),
        config.sms_api_password.clone(),
    ));

    let state = Arc::new(AppState {
        config,
        db,
        gazetteer,
        feed,
        notifier,
    });

    (create_router(state.clone()), state)
}

/// Mint a session token for `recipient_id` using the test signing key.
#[allow(dead_code)]
pub fn auth_token(state: &AppState, recipient_id: &str) -> String {
    quakewatch::middleware::auth::create_jwt(recipient_id, &state.config.jwt_signing_key)
        .expect("Failed to create test JWT")
}
