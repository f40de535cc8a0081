// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Train store: Firestore in production, in-memory for tests and local runs.
//!
//! Expiry is enforced lazily: reads treat an expired train exactly like a
//! missing one. Nothing ever deletes expired documents from here.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::models::train::{check_append_only, check_membership};
use crate::models::{Participant, Train, TrainStats, TrainUpdate};
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const TRAINS: &str = "trains";
}

/// Handle to whichever backend is configured. Cheap to clone.
#[derive(Clone)]
pub enum TrainDb {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl TrainDb {
    /// Connect to the backend selected in `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.store_backend {
            StoreBackend::Firestore => {
                Ok(TrainDb::Firestore(FirestoreDb::new(&config.gcp_project_id).await?))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory train store; data is lost on restart");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn in_memory() -> Self {
        TrainDb::Memory(MemoryDb::default())
    }

    /// Insert a new train. Fails with `Conflict` if the id is taken.
    pub async fn create_train(&self, train: &Train) -> Result<Train, AppError> {
        match self {
            TrainDb::Firestore(db) => db.create_train(train).await,
            TrainDb::Memory(db) => db.create_train(train),
        }
    }

    /// Fetch a train, or `None` if it is missing or expired at `now`.
    pub async fn get_train(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Train>, AppError> {
        match self {
            TrainDb::Firestore(db) => db.get_train(id, now).await,
            TrainDb::Memory(db) => Ok(db.get_train(id, now)),
        }
    }

    /// Apply a partial update. Checks existence only, not expiry.
    pub async fn update_train(
        &self,
        id: &str,
        update: TrainUpdate,
        now: DateTime<Utc>,
    ) -> Result<Train, AppError> {
        match self {
            TrainDb::Firestore(db) => db.update_train(id, update, now).await,
            TrainDb::Memory(db) => db.update_train(id, update, now),
        }
    }

    /// Append one participant after re-checking expiry and uniqueness.
    pub async fn append_participant(
        &self,
        id: &str,
        participant: Participant,
        now: DateTime<Utc>,
    ) -> Result<Train, AppError> {
        match self {
            TrainDb::Firestore(db) => db.append_participant(id, participant, now).await,
            TrainDb::Memory(db) => db.append_participant(id, participant, now),
        }
    }

    /// Aggregate counts over trains still active at `now`.
    pub async fn train_stats(&self, now: DateTime<Utc>) -> Result<TrainStats, AppError> {
        match self {
            TrainDb::Firestore(db) => db.train_stats(now).await,
            TrainDb::Memory(db) => Ok(db.train_stats(now)),
        }
    }
}

/// Apply `update` to `train` in place, bumping version and `updated_at`.
///
/// `train` must be the row as currently stored (locked or read inside the
/// write's transaction): the membership and append-only rules are checked
/// against it, not against whatever the caller saw earlier.
fn apply_update(train: &mut Train, update: TrainUpdate, now: DateTime<Utc>) -> Result<(), AppError> {
    if let Some(expected) = update.expected_version {
        if expected != train.version {
            return Err(AppError::Conflict(format!(
                "train was modified (expected version {}, found {})",
                expected, train.version
            )));
        }
    }

    if let Some(next) = update.participants {
        check_membership(&next).map_err(|e| AppError::BadRequest(e.to_string()))?;
        check_append_only(&train.participants, &next)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        // Stored entries are kept as they are; only the new tail is taken.
        let appended: Vec<Participant> = next
            .into_iter()
            .skip(train.participants.len())
            .map(|p| Participant {
                joined_at: now,
                ..p
            })
            .collect();
        train.participants.extend(appended);
    }
    train.updated_at = now;
    train.version += 1;
    Ok(())
}

/// Append `participant` to a live train in place.
fn apply_append(
    train: &mut Train,
    participant: Participant,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if train.is_expired(now) {
        return Err(AppError::NotFound);
    }
    if train.has_participant(&participant.username) {
        return Err(AppError::DuplicateParticipant);
    }

    train.participants.push(Participant {
        is_host: false,
        ..participant
    });
    train.updated_at = now;
    train.version += 1;
    Ok(())
}
