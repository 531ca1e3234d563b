// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Recipients (identity and contact records)
//! - Alert thresholds (per-recipient configuration)
//! - Drill events (operator-injected synthetic earthquakes)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{AlertThreshold, Recipient, SeismicEvent};
use crate::services::SmsTarget;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Recipient Operations ────────────────────────────────────

    /// Get a recipient by id.
    pub async fn get_recipient(&self, recipient_id: &str) -> Result<Option<Recipient>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::RECIPIENTS)
            .obj()
            .one(recipient_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a recipient record.
    pub async fn upsert_recipient(&self, recipient: &Recipient) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::RECIPIENTS)
            .document_id(&recipient.id)
            .object(recipient)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Threshold Operations ────────────────────────────────────

    /// Get a recipient's threshold (one per recipient, keyed by owner id).
    pub async fn get_threshold(&self, owner_id: &str) -> Result<Option<AlertThreshold>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ALERT_THRESHOLDS)
            .obj()
            .one(owner_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or fully replace a threshold. Last write wins per record; there
    /// is no cross-record transactional requirement.
    pub async fn set_threshold(&self, threshold: &AlertThreshold) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ALERT_THRESHOLDS)
            .document_id(&threshold.owner_id)
            .object(threshold)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All thresholds with SMS alerts enabled, in natural retrieval order.
    pub async fn list_sms_thresholds(&self) -> Result<Vec<AlertThreshold>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ALERT_THRESHOLDS)
            .filter(|q| q.for_all([q.field("sms_enabled").eq(true)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Snapshot of SMS-enabled thresholds joined with their owners' contact
    /// records, for one fan-out invocation.
    ///
    /// Owner lookups run concurrently with a bounded limit. A threshold whose
    /// owner record is missing is dropped from the snapshot.
    pub async fn load_sms_targets(&self) -> Result<Vec<SmsTarget>, AppError> {
        let thresholds = self.list_sms_thresholds().await?;

        let targets = stream::iter(thresholds)
            .map(|threshold| async move {
                let recipient = self.get_recipient(&threshold.owner_id).await?;
                Ok::<_, AppError>(recipient.map(|recipient| SmsTarget {
                    threshold,
                    recipient,
                }))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<SmsTarget>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<SmsTarget>>, AppError>>()?;

        Ok(targets.into_iter().flatten().collect())
    }

    // ─── Drill Event Operations ──────────────────────────────────

    /// Store a synthetic drill event, keyed by its content identity.
    pub async fn set_drill_event(&self, event: &SeismicEvent) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DRILL_EVENTS)
            .document_id(event.identity())
            .object(event)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List drill events within a time window, newest first.
    pub async fn list_drill_events(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<SeismicEvent>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DRILL_EVENTS)
            .filter(move |q| {
                q.for_all([
                    q.field("occurred_at_ms").greater_than_or_equal(start_ms),
                    q.field("occurred_at_ms").less_than_or_equal(end_ms),
                ])
            })
            .order_by([(
                "occurred_at_ms",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every stored drill event. Returns the number deleted.
    ///
    /// Deletes run concurrently with a bounded limit; drills are low-volume
    /// so no transaction batching is needed.
    pub async fn purge_drill_events(&self) -> Result<usize, AppError> {
        let events: Vec<SeismicEvent> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::DRILL_EVENTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = events.len();
        let client = self.get_client()?;

        stream::iter(events)
            .map(|event| async move {
                client
                    .fluent()
                    .delete()
                    .from(collections::DRILL_EVENTS)
                    .document_id(event.identity())
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::info!(count, "Purged drill events");
        Ok(count)
    }
}
