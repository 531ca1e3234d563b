// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set). The emulator provides a clean state for
//! each test run.

use quakewatch::models::{AlertThreshold, Recipient, SeismicEvent};

mod common;
use common::test_db;

/// Generate a unique recipient id for test isolation.
fn unique_recipient_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-recipient-{nanos}")
}

fn test_threshold(owner_id: &str, sms_enabled: bool) -> AlertThreshold {
    AlertThreshold {
        owner_id: owner_id.to_string(),
        latitude: 14.60,
        longitude: 120.98,
        location_label: "Manila, Philippines".to_string(),
        minimum_magnitude: 4.0,
        radius_km: 100.0,
        sms_enabled,
        push_enabled: true,
        updated_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[tokio::test]
async fn test_threshold_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let owner = unique_recipient_id();

    assert!(db.get_threshold(&owner).await.unwrap().is_none());

    let threshold = test_threshold(&owner, false);
    db.set_threshold(&threshold).await.unwrap();

    let stored = db.get_threshold(&owner).await.unwrap().unwrap();
    assert_eq!(stored.owner_id, owner);
    assert_eq!(stored.radius_km, 100.0);
    assert!(!stored.sms_enabled);
}

#[tokio::test]
async fn test_threshold_full_replace() {
    require_emulator!();

    let db = test_db().await;
    let owner = unique_recipient_id();

    db.set_threshold(&test_threshold(&owner, false)).await.unwrap();

    let mut replacement = test_threshold(&owner, true);
    replacement.radius_km = 25.0;
    db.set_threshold(&replacement).await.unwrap();

    // Full replace, no history
    let stored = db.get_threshold(&owner).await.unwrap().unwrap();
    assert_eq!(stored.radius_km, 25.0);
    assert!(stored.sms_enabled);
}

#[tokio::test]
async fn test_sms_targets_join_recipients() {
    require_emulator!();

    let db = test_db().await;
    let owner = unique_recipient_id();

    db.upsert_recipient(&Recipient {
        id: owner.clone(),
        username: "ana".to_string(),
        phone_number: Some("09171234567".to_string()),
    })
    .await
    .unwrap();
    db.set_threshold(&test_threshold(&owner, true)).await.unwrap();

    let targets = db.load_sms_targets().await.unwrap();
    let mine: Vec<_> = targets
        .iter()
        .filter(|t| t.threshold.owner_id == owner)
        .collect();

    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].recipient.phone_number.as_deref(), Some("09171234567"));
}

#[tokio::test]
async fn test_sms_disabled_threshold_not_targeted() {
    require_emulator!();

    let db = test_db().await;
    let owner = unique_recipient_id();

    db.upsert_recipient(&Recipient {
        id: owner.clone(),
        username: "ben".to_string(),
        phone_number: Some("09181234567".to_string()),
    })
    .await
    .unwrap();
    db.set_threshold(&test_threshold(&owner, false)).await.unwrap();

    let targets = db.load_sms_targets().await.unwrap();
    assert!(!targets.iter().any(|t| t.threshold.owner_id == owner));
}

#[tokio::test]
async fn test_drill_event_lifecycle() {
    require_emulator!();

    let db = test_db().await;
    let now = chrono::Utc::now().timestamp_millis();

    let drill = SeismicEvent {
        occurred_at_ms: now,
        latitude: Some(14.65),
        longitude: Some(121.03),
        depth_km: Some(5.0),
        magnitude: 6.0,
        place: format!("Drill site {now}"),
        is_synthetic: true,
    };
    db.set_drill_event(&drill).await.unwrap();

    let listed = db.list_drill_events(now - 1000, now + 1000).await.unwrap();
    assert!(listed.iter().any(|e| e.identity() == drill.identity()));
    assert!(listed.iter().all(|e| e.is_synthetic));

    let deleted = db.purge_drill_events().await.unwrap();
    assert!(deleted >= 1);

    let after = db.list_drill_events(now - 1000, now + 1000).await.unwrap();
    assert!(after.is_empty());
}
