// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Alert severity classification and the active alert state.

use crate::models::SeismicEvent;
use serde::{Deserialize, Serialize};

/// Severity band for a matched event, by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    None,
    Notice,
    Warning,
    Emergency,
}

impl AlertLevel {
    /// Band boundaries: Notice >= 3.0, Warning >= 4.0, Emergency >= 5.0.
    pub fn for_magnitude(magnitude: f64) -> Self {
        if magnitude >= 5.0 {
            AlertLevel::Emergency
        } else if magnitude >= 4.0 {
            AlertLevel::Warning
        } else if magnitude >= 3.0 {
            AlertLevel::Notice
        } else {
            AlertLevel::None
        }
    }

    /// Banner text used in outbound messages and the watcher console.
    pub fn banner(&self) -> &'static str {
        match self {
            AlertLevel::Emergency => "EARTHQUAKE ALERT",
            AlertLevel::Warning => "EARTHQUAKE WARNING",
            AlertLevel::Notice => "EARTHQUAKE NOTICE",
            AlertLevel::None => "EARTHQUAKE ADVISORY",
        }
    }
}

/// Descriptive magnitude scale label (Micro through Great).
pub fn magnitude_severity(magnitude: f64) -> &'static str {
    if magnitude < 2.0 {
        "Micro"
    } else if magnitude < 4.0 {
        "Minor"
    } else if magnitude < 5.0 {
        "Light"
    } else if magnitude < 6.0 {
        "Moderate"
    } else if magnitude < 7.0 {
        "Strong"
    } else if magnitude < 8.0 {
        "Major"
    } else {
        "Great"
    }
}

/// The single live alert interruption for a monitor.
///
/// While one exists, the monitor suspends all evaluation; there is no
/// queueing or stacking of alerts.
#[derive(Debug, Clone)]
pub struct ActiveAlert {
    pub event: SeismicEvent,
    pub opened_at_ms: i64,
}
