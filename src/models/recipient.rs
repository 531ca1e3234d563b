//! Recipient identity and contact record.

use serde::{Deserialize, Serialize};

/// Recipient profile stored in Firestore.
///
/// Account management (signup, credentials) lives outside this service; we
/// only read the identity and contact fields the engine needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// Recipient id (also used as document id)
    pub id: String,
    /// Display name
    pub username: String,
    /// Contact number for SMS alerts (any format; normalized at send time)
    pub phone_number: Option<String>,
}
