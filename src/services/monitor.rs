// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side event monitor: the polling state machine that raises at most
//! one alert interruption at a time for one recipient.
//!
//! Each cycle is driven with an explicit `now` so tests never wait on the
//! wall clock; the production ticker lives in the watcher binary.

use crate::models::{ActiveAlert, LocalSettings, SeismicEvent};
use crate::services::evaluator;
use crate::services::feed::EventFeed;
use crate::services::gazetteer::Gazetteer;
use crate::services::ledger::DedupLedger;
use geo::Point;
use std::sync::Arc;

/// Events older than this are assumed settled and skipped entirely, without
/// being ledgered. This bounds ledger growth.
pub const RECENCY_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// What one poll cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// An alert is open; the whole cycle was skipped. Unledgered events will
    /// be re-evaluated after the alert closes.
    AlertOpen,
    /// Feed fetch failed; nothing was mutated. Retried next tick.
    FeedFailed,
    /// Cold-start pass: recent events ledgered without alerting.
    CaughtUp { marked: usize },
    /// Normal pass.
    Evaluated {
        marked: usize,
        alert_raised: Option<String>,
    },
}

/// Polling monitor for one recipient session.
///
/// Single-writer: cycles never overlap (the caller's ticker skips when busy),
/// and `close_alert` / `apply_settings` happen between cycles.
pub struct EventMonitor<F: EventFeed> {
    feed: F,
    ledger: DedupLedger,
    gazetteer: Arc<Gazetteer>,
    settings: LocalSettings,
    device_location: Option<Point<f64>>,
    active_alert: Option<ActiveAlert>,
    caught_up: bool,
}

impl<F: EventFeed> EventMonitor<F> {
    /// Build a monitor over a freshly loaded ledger.
    ///
    /// If the settings differ from the snapshot the ledger was written under,
    /// the recent window is invalidated up front, so a configuration change
    /// made while the process was down still triggers re-evaluation.
    pub fn new(
        feed: F,
        mut ledger: DedupLedger,
        gazetteer: Arc<Gazetteer>,
        settings: LocalSettings,
        now_ms: i64,
    ) -> Self {
        match ledger.settings_snapshot() {
            Some(snapshot) if *snapshot == settings => {}
            Some(_) => {
                tracing::info!("Settings changed since last run, invalidating recent entries");
                ledger.invalidate_recent(now_ms);
                ledger.set_settings_snapshot(settings.clone());
            }
            None => ledger.set_settings_snapshot(settings.clone()),
        }

        Self {
            feed,
            ledger,
            gazetteer,
            settings,
            device_location: None,
            active_alert: None,
            caught_up: false,
        }
    }

    /// Last-known device coordinate, used as the anchor fallback when no
    /// location is configured.
    pub fn set_device_location(&mut self, location: Option<Point<f64>>) {
        self.device_location = location;
    }

    pub fn active_alert(&self) -> Option<&ActiveAlert> {
        self.active_alert.as_ref()
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// Close the open alert and return to `Idle`. The only cancellation
    /// signal in the system; has no effect on in-flight fan-out calls.
    pub fn close_alert(&mut self) -> Option<ActiveAlert> {
        self.active_alert.take()
    }

    /// Apply a configuration change. Entries from the last 24 h are
    /// invalidated so the next cycle re-evaluates them under the new rule.
    pub fn apply_settings(&mut self, settings: LocalSettings, now_ms: i64) {
        if settings == self.settings {
            return;
        }
        self.settings = settings.clone();
        self.ledger.invalidate_recent(now_ms);
        self.ledger.set_settings_snapshot(settings);
        self.persist_ledger();
    }

    /// Run one poll cycle at `now_ms`.
    pub async fn run_cycle(&mut self, now_ms: i64) -> CycleOutcome {
        if self.active_alert.is_some() {
            tracing::debug!("Alert open, skipping cycle");
            return CycleOutcome::AlertOpen;
        }

        let window_start = now_ms - RECENCY_WINDOW_MS;
        let events = match self
            .feed
            .recent_events(window_start, now_ms, 0.0)
            .await
        {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "Feed fetch failed, skipping cycle");
                return CycleOutcome::FeedFailed;
            }
        };

        // The window is part of the request, but re-check locally: the feed
        // is an external collaborator and may return out-of-window records.
        let recent: Vec<SeismicEvent> = events
            .into_iter()
            .filter(|e| e.occurred_at_ms >= window_start)
            .collect();

        self.ledger.evict_expired(now_ms);

        if !self.caught_up {
            let outcome = self.catch_up(&recent);
            self.caught_up = true;
            self.persist_ledger();
            return outcome;
        }

        let outcome = self.evaluate(&recent, now_ms);
        self.persist_ledger();
        outcome
    }

    /// Cold-start pass: mark every recent unledgered event as seen without
    /// alerting, so a reload never replays a day of history as alerts.
    fn catch_up(&mut self, recent: &[SeismicEvent]) -> CycleOutcome {
        let mut marked = 0;
        for event in recent {
            let identity = event.identity();
            if !self.ledger.has(&identity) {
                self.ledger
                    .mark_seen(&identity, event.occurred_at_ms, event.is_synthetic);
                marked += 1;
            }
        }
        tracing::info!(marked, "Catch-up pass complete");
        CycleOutcome::CaughtUp { marked }
    }

    /// Normal pass: raise an alert for the first unledgered match, mark it
    /// seen, and stop evaluating for this cycle. Non-matching events are
    /// marked seen silently.
    fn evaluate(&mut self, recent: &[SeismicEvent], now_ms: i64) -> CycleOutcome {
        let mut marked = 0;
        let mut alert_raised = None;

        for event in recent {
            let identity = event.identity();
            if self.ledger.has(&identity) {
                continue;
            }

            let is_match = evaluator::matches(
                event,
                &self.settings,
                self.device_location,
                &self.gazetteer,
            );

            self.ledger
                .mark_seen(&identity, event.occurred_at_ms, event.is_synthetic);
            marked += 1;

            if is_match {
                tracing::info!(
                    magnitude = event.magnitude,
                    place = %event.place,
                    "Raising alert"
                );
                self.active_alert = Some(ActiveAlert {
                    event: event.clone(),
                    opened_at_ms: now_ms,
                });
                alert_raised = Some(identity);
                // One alert per cycle; remaining events wait for the next
                // cycle after the alert closes.
                break;
            }
        }

        CycleOutcome::Evaluated {
            marked,
            alert_raised,
        }
    }

    fn persist_ledger(&self) {
        if let Err(e) = self.ledger.persist() {
            tracing::warn!(error = %e, "Failed to persist ledger");
        }
    }
}
