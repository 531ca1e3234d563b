// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quakewatch watcher: the client-side monitor loop for one recipient.
//!
//! Polls the event feed on a fixed interval, evaluates unseen events against
//! the local settings, and raises at most one console alert at a time. The
//! dedup ledger lives in a local JSON file so restarts never re-alert on
//! already-seen events. Optionally forwards each raised alert to the API
//! server's fan-out trigger.

use quakewatch::models::{magnitude_severity, ActiveAlert, AlertLevel, LocalSettings};
use quakewatch::services::{CycleOutcome, DedupLedger, EventMonitor, FeedClient, Gazetteer};
use quakewatch::time_utils::now_epoch_ms;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Watcher settings from environment variables.
struct WatchConfig {
    feed_base_url: String,
    gazetteer_path: String,
    ledger_path: String,
    poll_interval: Duration,
    /// Open alerts auto-close (acknowledge) after this long
    ack_after: Duration,
    settings: LocalSettings,
    device_location: Option<(f64, f64)>,
    /// Fan-out trigger endpoint and bearer token, when forwarding is wanted
    notify_url: Option<String>,
    notify_token: Option<String>,
}

impl WatchConfig {
    fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let settings = LocalSettings {
            minimum_magnitude: env_f64("WATCH_MIN_MAGNITUDE")
                .unwrap_or(LocalSettings::default().minimum_magnitude),
            radius_km: env_f64("WATCH_RADIUS_KM").unwrap_or(LocalSettings::default().radius_km),
            latitude: env_f64("WATCH_LAT"),
            longitude: env_f64("WATCH_LON"),
            location_label: env::var("WATCH_LOCATION").ok().filter(|s| !s.is_empty()),
        };

        let device_location = match (env_f64("WATCH_DEVICE_LAT"), env_f64("WATCH_DEVICE_LON")) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };

        Self {
            feed_base_url: env::var("FEED_BASE_URL")
                .unwrap_or_else(|_| quakewatch::config::DEFAULT_FEED_URL.to_string()),
            gazetteer_path: env::var("GAZETTEER_PATH")
                .unwrap_or_else(|_| "data/gazetteer.geojson".to_string()),
            ledger_path: env::var("WATCH_LEDGER_PATH")
                .unwrap_or_else(|_| "quakewatch-ledger.json".to_string()),
            poll_interval: Duration::from_secs(env_u64("WATCH_POLL_SECONDS").unwrap_or(30)),
            ack_after: Duration::from_secs(env_u64("WATCH_ACK_SECONDS").unwrap_or(30)),
            settings,
            device_location,
            notify_url: env::var("WATCH_NOTIFY_URL").ok(),
            notify_token: env::var("WATCH_NOTIFY_TOKEN").ok(),
        }
    }
}

fn env_f64(name: &str) -> Option<f64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quakewatch=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .init();

    let config = WatchConfig::from_env();

    let gazetteer = match Gazetteer::load_from_file(&config.gazetteer_path) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            tracing::warn!(error = %e, "Gazetteer unavailable, place lookups will miss");
            Arc::new(Gazetteer::default())
        }
    };

    let now = now_epoch_ms();
    let ledger = DedupLedger::load(&config.ledger_path, now);
    tracing::info!(
        path = %config.ledger_path,
        entries = ledger.len(),
        "Ledger loaded"
    );

    let feed = FeedClient::new(config.feed_base_url.clone());
    let mut monitor = EventMonitor::new(feed, ledger, gazetteer, config.settings.clone(), now);
    monitor.set_device_location(
        config
            .device_location
            .map(|(lat, lon)| geo::Point::new(lon, lat)),
    );

    tracing::info!(
        poll_secs = config.poll_interval.as_secs(),
        min_magnitude = config.settings.minimum_magnitude,
        radius_km = config.settings.radius_km,
        "Watcher started"
    );

    // Skip-if-busy: a cycle still in flight swallows the next tick rather
    // than queueing it.
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = now_epoch_ms();
                ack_stale_alert(&mut monitor, now, config.ack_after);

                match monitor.run_cycle(now).await {
                    CycleOutcome::AlertOpen => {}
                    CycleOutcome::FeedFailed => {}
                    CycleOutcome::CaughtUp { marked } => {
                        tracing::info!(marked, "Caught up with recent events");
                    }
                    CycleOutcome::Evaluated { alert_raised: Some(_), .. } => {
                        if let Some(alert) = monitor.active_alert() {
                            print_alert(alert);
                            forward_alert(&config, alert).await;
                        }
                    }
                    CycleOutcome::Evaluated { .. } => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }
}

/// Close an open alert once the acknowledgement window has passed, returning
/// the monitor to `Idle` for the next cycle.
fn ack_stale_alert<F: quakewatch::services::EventFeed>(
    monitor: &mut EventMonitor<F>,
    now_ms: i64,
    ack_after: Duration,
) {
    let stale = monitor
        .active_alert()
        .is_some_and(|alert| now_ms - alert.opened_at_ms >= ack_after.as_millis() as i64);
    if stale {
        if let Some(alert) = monitor.close_alert() {
            tracing::info!(place = %alert.event.place, "Alert acknowledged");
        }
    }
}

fn print_alert(alert: &ActiveAlert) {
    let event = &alert.event;
    let level = AlertLevel::for_magnitude(event.magnitude);
    let time = chrono::DateTime::from_timestamp_millis(event.occurred_at_ms)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_else(|| "unknown".to_string());

    println!("\u{1F6A8} {} \u{1F6A8}", level.banner());
    println!(
        "  M{:.1} ({}) - {}",
        event.magnitude,
        magnitude_severity(event.magnitude),
        event.place
    );
    if let Some(depth) = event.depth_km {
        println!("  Depth: {depth} km");
    }
    println!("  Time:  {time}");
}

/// Forward a raised alert to the server's fan-out trigger, carrying the live
/// local settings as the override. Failures are logged and never retried;
/// fan-out is decoupled from the local ledger.
async fn forward_alert(config: &WatchConfig, alert: &ActiveAlert) {
    let (Some(url), Some(token)) = (&config.notify_url, &config.notify_token) else {
        return;
    };
    let event = &alert.event;
    let (Some(lat), Some(lon)) = (event.latitude, event.longitude) else {
        tracing::debug!("Alert has no epicenter coordinates, not forwarding");
        return;
    };

    let mut body = serde_json::json!({
        "latitude": lat,
        "longitude": lon,
        "magnitude": event.magnitude,
        "place": event.place,
        "depth_km": event.depth_km,
        "occurred_at_ms": event.occurred_at_ms,
        "is_synthetic": event.is_synthetic,
    });
    if let (Some(lat), Some(lon)) = (config.settings.latitude, config.settings.longitude) {
        body["current_settings"] = serde_json::json!({
            "latitude": lat,
            "longitude": lon,
            "minimum_magnitude": config.settings.minimum_magnitude,
            "radius_km": config.settings.radius_km,
        });
    }

    let client = reqwest::Client::new();
    match client
        .post(url)
        .bearer_auth(token)
        .json(&body)
        .timeout(Duration::from_secs(15))
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => {
            tracing::info!("Alert forwarded to fan-out trigger");
        }
        Ok(response) => {
            tracing::warn!(status = %response.status(), "Fan-out trigger rejected alert");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to reach fan-out trigger");
        }
    }
}
