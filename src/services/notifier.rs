// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side fan-out: one event, all SMS-enabled recipients, one batched
//! delivery call.
//!
//! Each invocation is independent: its own address-dedup set and its own
//! threshold snapshot (loaded by the caller). Fan-out has no coupling to the
//! client-side dedup ledger, and a delivery failure is reported but never
//! retried or rolled back.

use crate::models::{AlertLevel, AlertThreshold, Recipient, SeismicEvent};
use crate::services::geo::distance_km;
use crate::services::sms::{normalize_phone, SmsChannel};
use serde::{Deserialize, Serialize};

/// One SMS-enabled threshold joined with its owner's contact record.
#[derive(Debug, Clone)]
pub struct SmsTarget {
    pub threshold: AlertThreshold,
    pub recipient: Recipient,
}

/// A not-yet-persisted threshold override from the triggering recipient.
///
/// Takes priority over that recipient's stored record. Unlike client-side
/// evaluation there is no location fallback here: the anchor is explicit and
/// required.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerOverride {
    pub latitude: f64,
    pub longitude: f64,
    pub minimum_magnitude: f64,
    pub radius_km: f64,
}

/// Per-recipient outcome row, preserved even when delivery fails so an
/// operator can audit or retry.
#[derive(Debug, Clone, Serialize)]
pub struct NotifiedRecipient {
    pub username: String,
    pub distance_km: f64,
    pub label: String,
}

/// Result of one fan-out invocation.
#[derive(Debug, Serialize)]
pub struct NotifyOutcome {
    /// False when the batched delivery call failed or timed out
    pub delivered: bool,
    /// Number of distinct addresses in the batch
    pub notified_count: usize,
    pub recipients: Vec<NotifiedRecipient>,
}

/// Fan-out engine over an SMS channel.
#[derive(Clone)]
pub struct FanoutNotifier<S: SmsChannel> {
    channel: S,
}

impl<S: SmsChannel> FanoutNotifier<S> {
    pub fn new(channel: S) -> Self {
        Self { channel }
    }

    /// Fan one event out to every qualifying recipient in `targets`.
    ///
    /// `trigger` is the triggering recipient with a live settings override;
    /// it is evaluated first so an unsaved configuration takes priority over
    /// the persisted record (the address dedup then skips the stored row).
    pub async fn notify(
        &self,
        event: &SeismicEvent,
        trigger: Option<(&Recipient, &TriggerOverride)>,
        targets: &[SmsTarget],
    ) -> NotifyOutcome {
        let mut queued_numbers: Vec<String> = Vec::new();
        let mut recipients: Vec<NotifiedRecipient> = Vec::new();

        if let Some((recipient, live)) = trigger {
            if let Some(phone) = recipient.phone_number.as_deref() {
                if event.magnitude >= live.minimum_magnitude {
                    let distance = event_distance(event, live.latitude, live.longitude);
                    if distance <= live.radius_km {
                        if let Some(number) = normalize_phone(phone) {
                            queued_numbers.push(number);
                            recipients.push(NotifiedRecipient {
                                username: recipient.username.clone(),
                                distance_km: distance,
                                label: "Live settings".to_string(),
                            });
                        }
                    }
                }
            }
        }

        for target in targets {
            let threshold = &target.threshold;
            let Some(phone) = target.recipient.phone_number.as_deref() else {
                continue;
            };
            let Some(number) = normalize_phone(phone) else {
                tracing::debug!(
                    owner = %threshold.owner_id,
                    "Skipping recipient with unnormalizable number"
                );
                continue;
            };
            if queued_numbers.contains(&number) {
                continue;
            }
            if event.magnitude < threshold.minimum_magnitude {
                continue;
            }

            let distance = event_distance(event, threshold.latitude, threshold.longitude);
            // Written so a NaN distance skips the recipient too
            if !(distance <= threshold.radius_km) {
                continue;
            }

            queued_numbers.push(number);
            recipients.push(NotifiedRecipient {
                username: target.recipient.username.clone(),
                distance_km: distance,
                label: threshold.location_label.clone(),
            });
        }

        if queued_numbers.is_empty() {
            tracing::info!(place = %event.place, "No recipients in range");
            return NotifyOutcome {
                delivered: true,
                notified_count: 0,
                recipients,
            };
        }

        let text = compose_message(event);
        let delivered = match self.channel.send_batch(&text, &queued_numbers).await {
            Ok(()) => {
                tracing::info!(
                    count = queued_numbers.len(),
                    place = %event.place,
                    "Alert SMS batch sent"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    count = queued_numbers.len(),
                    "Alert SMS batch failed"
                );
                false
            }
        };

        NotifyOutcome {
            delivered,
            notified_count: queued_numbers.len(),
            recipients,
        }
    }
}

fn event_distance(event: &SeismicEvent, anchor_lat: f64, anchor_lon: f64) -> f64 {
    // Fan-out requires explicit event coordinates at the API boundary, but a
    // missing pair still degrades to a NaN distance (never in radius) rather
    // than a panic.
    let lat = event.latitude.unwrap_or(f64::NAN);
    let lon = event.longitude.unwrap_or(f64::NAN);
    distance_km(anchor_lat, anchor_lon, lat, lon)
}

/// Fixed outbound message template: severity banner, magnitude, place,
/// depth, time, safety reminder.
pub fn compose_message(event: &SeismicEvent) -> String {
    let banner = AlertLevel::for_magnitude(event.magnitude).banner();
    let place = if event.place.is_empty() {
        match (event.latitude, event.longitude) {
            (Some(lat), Some(lon)) => format!("{lat:.4}, {lon:.4}"),
            _ => "Unknown location".to_string(),
        }
    } else {
        event.place.clone()
    };
    let depth = match event.depth_km {
        Some(d) => format!("{d} km"),
        None => "N/A".to_string(),
    };
    let time = chrono::DateTime::from_timestamp_millis(event.occurred_at_ms)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_else(|| "Just now".to_string());

    format!(
        "\u{1F6A8} {banner} \u{1F6A8}\n\n\
         Magnitude: {magnitude:.1}\n\
         Location: {place}\n\
         Depth: {depth}\n\
         Time: {time}\n\n\
         Please stay safe and follow safety guidelines.",
        magnitude = event.magnitude,
    )
}
