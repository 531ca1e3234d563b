// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod evaluator;
pub mod feed;
pub mod gazetteer;
pub mod geo;
pub mod ledger;
pub mod monitor;
pub mod notifier;
pub mod sms;

pub use feed::{EventFeed, FeedClient, FeedError};
pub use gazetteer::Gazetteer;
pub use ledger::DedupLedger;
pub use monitor::{CycleOutcome, EventMonitor};
pub use notifier::{FanoutNotifier, NotifyOutcome, SmsTarget, TriggerOverride};
pub use sms::{SmsChannel, SmsGateClient};
