// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable deduplication ledger.
//!
//! Records which event identities have already been handled so a recipient is
//! alerted at most once per event across poll cycles and process restarts.
//! Also carries the settings snapshot last used for evaluation, so a
//! configuration change made while the watcher was down is still detected.

use crate::models::LocalSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Entries older than this are dropped.
pub const RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1000;
/// Window cleared when the recipient's configuration changes.
pub const INVALIDATION_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;
/// Capacity safety valve: oldest entries beyond this count are dropped.
pub const MAX_ENTRIES: usize = 100;

/// One handled event identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupEntry {
    pub event_identity: String,
    pub first_seen_at_ms: i64,
    #[serde(default)]
    pub is_synthetic: bool,
}

/// On-disk shape: entries plus the settings snapshot they were evaluated under.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    settings: Option<LocalSettings>,
    entries: Vec<DedupEntry>,
}

/// Bounded, time-windowed dedup ledger with atomic file persistence.
///
/// Single-writer: the owning monitor is the only mutator, so no internal
/// locking is needed.
pub struct DedupLedger {
    path: Option<PathBuf>,
    /// Insertion order, oldest first
    entries: Vec<DedupEntry>,
    identities: HashSet<String>,
    settings_snapshot: Option<LocalSettings>,
}

impl DedupLedger {
    /// An ephemeral ledger with no backing file (fan-out path, tests).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Vec::new(),
            identities: HashSet::new(),
            settings_snapshot: None,
        }
    }

    /// Load the ledger from `path`, applying retention eviction immediately
    /// so stale entries never resurrect.
    ///
    /// A missing file starts empty; an unreadable one is logged and treated
    /// as empty rather than crashing the watcher.
    pub fn load<P: AsRef<Path>>(path: P, now_ms: i64) -> Self {
        let path = path.as_ref().to_path_buf();
        let file = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<LedgerFile>(&data) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ledger file corrupt, starting empty");
                    LedgerFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerFile::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read ledger, starting empty");
                LedgerFile::default()
            }
        };

        let mut ledger = Self {
            path: Some(path),
            entries: file.entries,
            identities: HashSet::new(),
            settings_snapshot: file.settings,
        };
        ledger.identities = ledger
            .entries
            .iter()
            .map(|e| e.event_identity.clone())
            .collect();
        ledger.evict_expired(now_ms);
        ledger
    }

    pub fn has(&self, event_identity: &str) -> bool {
        self.identities.contains(event_identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Idempotent insert: a second call with the same identity keeps the
    /// original entry.
    pub fn mark_seen(&mut self, event_identity: &str, occurred_at_ms: i64, is_synthetic: bool) {
        if self.identities.contains(event_identity) {
            return;
        }
        self.identities.insert(event_identity.to_string());
        self.entries.push(DedupEntry {
            event_identity: event_identity.to_string(),
            first_seen_at_ms: occurred_at_ms,
            is_synthetic,
        });
    }

    /// Drop entries older than the retention window, then enforce the
    /// capacity bound by dropping the oldest-inserted entries.
    pub fn evict_expired(&mut self, now_ms: i64) {
        let cutoff = now_ms - RETENTION_MS;
        self.retain(|e| e.first_seen_at_ms >= cutoff);

        if self.entries.len() > MAX_ENTRIES {
            let drop_count = self.entries.len() - MAX_ENTRIES;
            let dropped: Vec<DedupEntry> = self.entries.drain(..drop_count).collect();
            for entry in &dropped {
                self.identities.remove(&entry.event_identity);
            }
        }
    }

    /// Drop entries younger than 24 h so a changed threshold re-evaluates
    /// recent events. Older entries stay: events outside the monitor's
    /// recency window would never be re-processed anyway.
    pub fn invalidate_recent(&mut self, now_ms: i64) {
        let cutoff = now_ms - INVALIDATION_WINDOW_MS;
        self.retain(|e| e.first_seen_at_ms < cutoff);
    }

    /// Drop all synthetic (drill) entries.
    pub fn purge_synthetic(&mut self) {
        self.retain(|e| !e.is_synthetic);
    }

    fn retain<F: Fn(&DedupEntry) -> bool>(&mut self, keep: F) {
        let identities = &mut self.identities;
        self.entries.retain(|e| {
            let kept = keep(e);
            if !kept {
                identities.remove(&e.event_identity);
            }
            kept
        });
    }

    /// The settings the entries were last evaluated under.
    pub fn settings_snapshot(&self) -> Option<&LocalSettings> {
        self.settings_snapshot.as_ref()
    }

    pub fn set_settings_snapshot(&mut self, settings: LocalSettings) {
        self.settings_snapshot = Some(settings);
    }

    /// Write the ledger to its backing file via temp file + rename, so a
    /// partial write never corrupts the previous state.
    ///
    /// No-op for in-memory ledgers.
    pub fn persist(&self) -> Result<(), LedgerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = LedgerFile {
            settings: self.settings_snapshot.clone(),
            entries: self.entries.clone(),
        };
        let data =
            serde_json::to_vec_pretty(&file).map_err(|e| LedgerError::Serialize(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &data).map_err(|e| LedgerError::Io(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| LedgerError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Errors from ledger persistence.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Failed to serialize ledger: {0}")]
    Serialize(String),

    #[error("Ledger I/O error: {0}")]
    Io(String),
}
