// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monitor state machine tests, driven with a scripted feed and explicit
//! timestamps so nothing waits on the wall clock.

mod common;

use quakewatch::models::{LocalSettings, SeismicEvent};
use quakewatch::services::feed::{EventFeed, FeedError};
use quakewatch::services::ledger::DedupLedger;
use quakewatch::services::monitor::{CycleOutcome, EventMonitor};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const NOW: i64 = 1_700_000_000_000;
const HOUR: i64 = 60 * 60 * 1000;

/// Feed that replays scripted responses, one per cycle.
struct ScriptedFeed {
    responses: Mutex<VecDeque<Result<Vec<SeismicEvent>, FeedError>>>,
}

impl ScriptedFeed {
    fn new(responses: Vec<Result<Vec<SeismicEvent>, FeedError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

impl EventFeed for ScriptedFeed {
    async fn recent_events(
        &self,
        _start_ms: i64,
        _end_ms: i64,
        _min_magnitude: f64,
    ) -> Result<Vec<SeismicEvent>, FeedError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }
}

fn manila_settings() -> LocalSettings {
    LocalSettings {
        minimum_magnitude: 4.0,
        radius_km: 100.0,
        latitude: Some(14.60),
        longitude: Some(120.98),
        location_label: None,
    }
}

fn matching_event(name: &str, age_hours: i64) -> SeismicEvent {
    SeismicEvent {
        occurred_at_ms: NOW - age_hours * HOUR,
        latitude: Some(14.65),
        longitude: Some(121.03),
        depth_km: Some(10.0),
        magnitude: 5.0,
        place: name.to_string(),
        is_synthetic: false,
    }
}

fn non_matching_event(name: &str, age_hours: i64) -> SeismicEvent {
    SeismicEvent {
        magnitude: 3.0,
        ..matching_event(name, age_hours)
    }
}

fn monitor(
    responses: Vec<Result<Vec<SeismicEvent>, FeedError>>,
) -> EventMonitor<ScriptedFeed> {
    EventMonitor::new(
        ScriptedFeed::new(responses),
        DedupLedger::in_memory(),
        Arc::new(common::test_gazetteer()),
        manila_settings(),
        NOW,
    )
}

#[tokio::test]
async fn test_first_cycle_is_catch_up_without_alerts() {
    let events = vec![matching_event("q1", 1), matching_event("q2", 2)];
    let mut m = monitor(vec![Ok(events)]);

    let outcome = m.run_cycle(NOW).await;

    assert_eq!(outcome, CycleOutcome::CaughtUp { marked: 2 });
    assert!(m.active_alert().is_none());
    assert!(m.ledger().has(&matching_event("q1", 1).identity()));
}

#[tokio::test]
async fn test_burst_raises_exactly_one_alert() {
    let burst: Vec<SeismicEvent> = (0..5).map(|i| matching_event(&format!("q{i}"), 1)).collect();
    let mut m = monitor(vec![Ok(vec![]), Ok(burst)]);

    // Catch-up on an empty feed, then the burst arrives
    m.run_cycle(NOW).await;
    let outcome = m.run_cycle(NOW).await;

    match outcome {
        CycleOutcome::Evaluated { alert_raised, .. } => assert!(alert_raised.is_some()),
        other => panic!("expected evaluated cycle, got {other:?}"),
    }
    assert!(m.active_alert().is_some());
}

#[tokio::test]
async fn test_open_alert_suspends_evaluation() {
    let burst: Vec<SeismicEvent> = (0..3).map(|i| matching_event(&format!("q{i}"), 1)).collect();
    let mut m = monitor(vec![
        Ok(vec![]),
        Ok(burst.clone()),
        Ok(burst.clone()),
        Ok(burst),
    ]);

    m.run_cycle(NOW).await;
    m.run_cycle(NOW).await;
    assert!(m.active_alert().is_some());
    let first_identity = m.active_alert().unwrap().event.identity();

    // While the alert is open the whole cycle is skipped
    assert_eq!(m.run_cycle(NOW).await, CycleOutcome::AlertOpen);

    // After closing, the remaining unledgered events are re-evaluated and
    // the next one alerts
    m.close_alert();
    let outcome = m.run_cycle(NOW).await;
    match outcome {
        CycleOutcome::Evaluated { alert_raised: Some(identity), .. } => {
            assert_ne!(identity, first_identity);
        }
        other => panic!("expected a second alert, got {other:?}"),
    }
}

#[tokio::test]
async fn test_same_event_never_alerts_twice() {
    let event = matching_event("repeat", 1);
    let mut m = monitor(vec![
        Ok(vec![]),
        Ok(vec![event.clone()]),
        Ok(vec![event.clone()]),
    ]);

    m.run_cycle(NOW).await;
    m.run_cycle(NOW).await;
    assert!(m.active_alert().is_some());
    m.close_alert();

    let outcome = m.run_cycle(NOW).await;
    assert_eq!(
        outcome,
        CycleOutcome::Evaluated {
            marked: 0,
            alert_raised: None
        }
    );
}

#[tokio::test]
async fn test_non_matching_events_marked_silently() {
    let mut m = monitor(vec![
        Ok(vec![]),
        Ok(vec![non_matching_event("small", 1)]),
    ]);

    m.run_cycle(NOW).await;
    let outcome = m.run_cycle(NOW).await;

    assert_eq!(
        outcome,
        CycleOutcome::Evaluated {
            marked: 1,
            alert_raised: None
        }
    );
    assert!(m.ledger().has(&non_matching_event("small", 1).identity()));
}

#[tokio::test]
async fn test_stale_events_skipped_entirely() {
    // 25 hours old: outside the recency window, not even ledgered
    let stale = matching_event("stale", 25);
    let mut m = monitor(vec![Ok(vec![]), Ok(vec![stale.clone()])]);

    m.run_cycle(NOW).await;
    let outcome = m.run_cycle(NOW).await;

    assert_eq!(
        outcome,
        CycleOutcome::Evaluated {
            marked: 0,
            alert_raised: None
        }
    );
    assert!(!m.ledger().has(&stale.identity()));
}

#[tokio::test]
async fn test_feed_failure_is_a_no_op_cycle() {
    let mut m = monitor(vec![
        Ok(vec![]),
        Err(FeedError::Request("connection refused".to_string())),
        Ok(vec![matching_event("after-outage", 1)]),
    ]);

    m.run_cycle(NOW).await;
    let before = m.ledger().len();

    assert_eq!(m.run_cycle(NOW).await, CycleOutcome::FeedFailed);
    assert_eq!(m.ledger().len(), before);
    assert!(m.active_alert().is_none());

    // Next tick retries and the event still alerts
    let outcome = m.run_cycle(NOW).await;
    match outcome {
        CycleOutcome::Evaluated { alert_raised, .. } => assert!(alert_raised.is_some()),
        other => panic!("expected evaluated cycle, got {other:?}"),
    }
}

#[tokio::test]
async fn test_settings_change_re_evaluates_recent_events() {
    let quiet = non_matching_event("borderline", 1);
    let mut m = monitor(vec![
        Ok(vec![]),
        Ok(vec![quiet.clone()]),
        Ok(vec![quiet.clone()]),
    ]);

    m.run_cycle(NOW).await;
    m.run_cycle(NOW).await;
    assert!(m.active_alert().is_none());
    assert!(m.ledger().has(&quiet.identity()));

    // Lower the magnitude floor; the recent entry is invalidated
    let mut loosened = manila_settings();
    loosened.minimum_magnitude = 2.5;
    m.apply_settings(loosened, NOW);
    assert!(!m.ledger().has(&quiet.identity()));

    let outcome = m.run_cycle(NOW).await;
    match outcome {
        CycleOutcome::Evaluated { alert_raised, .. } => assert!(alert_raised.is_some()),
        other => panic!("expected re-evaluation to alert, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cold_start_with_changed_settings_invalidates_snapshot() {
    let mut ledger = DedupLedger::in_memory();
    ledger.mark_seen("recent", NOW - HOUR, false);
    ledger.mark_seen("settled", NOW - 25 * HOUR, false);
    ledger.set_settings_snapshot(manila_settings());

    let mut changed = manila_settings();
    changed.radius_km = 10.0;

    let m = EventMonitor::new(
        ScriptedFeed::new(vec![]),
        ledger,
        Arc::new(common::test_gazetteer()),
        changed,
        NOW,
    );

    assert!(!m.ledger().has("recent"));
    assert!(m.ledger().has("settled"));
}
