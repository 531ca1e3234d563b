// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod alert;
pub mod event;
pub mod recipient;
pub mod threshold;

pub use alert::{magnitude_severity, ActiveAlert, AlertLevel};
pub use event::SeismicEvent;
pub use recipient::Recipient;
pub use threshold::{AlertThreshold, LocalSettings, ThresholdPayload};
