// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed train operations.
//!
//! One document per train in the `trains` collection, keyed by train id.
//! Participants are embedded as an ordered array, so a read returns them
//! exactly as written.
//!
//! Updates and appends run as transactions: the row is read and locked,
//! checked, then written back, so concurrent writers never overwrite each
//! other and `expectedVersion` is checked against the committed row.

use super::{apply_append, apply_update, collections};
use crate::error::AppError;
use crate::models::stats::StatsRow;
use crate::models::{Participant, Platform, Train, TrainStats, TrainUpdate};
use crate::time_utils::{format_utc_rfc3339, rfc3339_millis};
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use firestore::FirestoreConsistencySelector;
use serde::Deserialize;

/// Commits to try before reporting a busy train.
const MAX_TRANSACTION_ATTEMPTS: usize = 3;

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

    /// Create an unconnected client.
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

    // ─── Train Operations ────────────────────────────────────────

    /// Insert a train; fails with `Conflict` if the document already exists.
    pub async fn create_train(&self, train: &Train) -> Result<Train, AppError> {
        self.get_client()?
            .fluent()
            .insert()
            .into(collections::TRAINS)
            .document_id(&train.id)
            .object(train)
            .execute::<Train>()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => {
                    AppError::Conflict(format!("train id {} already exists", train.id))
                }
                other => AppError::Database(other.to_string()),
            })
    }

    /// Read a train document regardless of expiry.
    async fn read_train(&self, id: &str) -> Result<Option<Train>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRAINS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a train, treating expired documents as missing.
    pub async fn get_train(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Train>, AppError> {
        Ok(self
            .read_train(id)
            .await?
            .filter(|train| !train.is_expired(now)))
    }

    pub async fn update_train(
        &self,
        id: &str,
        update: TrainUpdate,
        now: DateTime<Utc>,
    ) -> Result<Train, AppError> {
        self.modify_train(id, |train| apply_update(train, update.clone(), now))
            .await
    }

    pub async fn append_participant(
        &self,
        id: &str,
        participant: Participant,
        now: DateTime<Utc>,
    ) -> Result<Train, AppError> {
        let train = self
            .modify_train(id, |train| apply_append(train, participant.clone(), now))
            .await?;

        tracing::debug!(
            train_id = id,
            participants = train.participants.len(),
            "Participant appended"
        );
        Ok(train)
    }

    /// Read-modify-write one train inside a Firestore transaction.
    ///
    /// The read goes through the transaction, so the document stays locked
    /// until commit and `modify` always sees the latest stored row. A commit
    /// aborted by contention reruns the whole step.
    async fn modify_train<F>(&self, id: &str, modify: F) -> Result<Train, AppError>
    where
        F: Fn(&mut Train) -> Result<(), AppError>,
    {
        let client = self.get_client()?;

        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let tx_client = client.clone_with_consistency_selector(
                FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
            );
            let current: Option<Train> = match tx_client
                .fluent()
                .select()
                .by_id_in(collections::TRAINS)
                .obj()
                .one(id)
                .await
            {
                Ok(current) => current,
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(AppError::Database(format!(
                        "Failed to read train in transaction: {}",
                        e
                    )));
                }
            };

            let Some(mut train) = current else {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound);
            };
            if let Err(e) = modify(&mut train) {
                let _ = transaction.rollback().await;
                return Err(e);
            }

            client
                .fluent()
                .update()
                .in_col(collections::TRAINS)
                .document_id(&train.id)
                .object(&train)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add train to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(train),
                Err(FirestoreError::DatabaseError(e))
                    if e.retry_possible && attempt < MAX_TRANSACTION_ATTEMPTS =>
                {
                    tracing::warn!(train_id = id, attempt, error = %e, "Train commit aborted, retrying");
                }
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Transaction commit failed: {}",
                        e
                    )))
                }
            }
        }

        Err(AppError::Conflict(format!(
            "train {} is busy, try again",
            id
        )))
    }

    // ─── Stats ───────────────────────────────────────────────────

    /// Aggregate over trains whose `expiresAt` is not yet past.
    ///
    /// Timestamps are stored fixed-width, so the string range filter is exact.
    pub async fn train_stats(&self, now: DateTime<Utc>) -> Result<TrainStats, AppError> {
        let cutoff = format_utc_rfc3339(now);

        let rows: Vec<TrainStatsRow> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TRAINS)
            .filter(move |q| q.field("expiresAt").greater_than_or_equal(cutoff.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(TrainStats::from_rows(&rows, now))
    }
}

/// The subset of a train document the stats query needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrainStatsRow {
    platform: Platform,
    #[serde(with = "rfc3339_millis")]
    created_at: DateTime<Utc>,
    #[serde(with = "rfc3339_millis")]
    expires_at: DateTime<Utc>,
}

impl StatsRow for TrainStatsRow {
    fn platform(&self) -> Platform {
        self.platform
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
