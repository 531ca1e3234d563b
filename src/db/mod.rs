//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const RECIPIENTS: &str = "recipients";
    pub const ALERT_THRESHOLDS: &str = "alert_thresholds";
    /// Operator-injected synthetic events for drills
    pub const DRILL_EVENTS: &str = "drill_events";
}
