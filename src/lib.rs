// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Quakewatch: earthquake alert matching, deduplication, and fan-out.
//!
//! This crate provides the backend API for per-recipient alert thresholds
//! and SMS fan-out, plus the client-side monitor engine used by the watcher
//! binary to raise local alerts at most once per event.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{FanoutNotifier, FeedClient, Gazetteer, SmsGateClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub gazetteer: Gazetteer,
    pub feed: FeedClient,
    pub notifier: FanoutNotifier<SmsGateClient>,
}
