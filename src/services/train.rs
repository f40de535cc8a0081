// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Train lifecycle: creation, joining, and validated raw writes.
//!
//! Handles the core workflow:
//! 1. Normalize raw input to a canonical username
//! 2. Resolve the profile (live or fallback)
//! 3. Enforce membership rules (host first, unique usernames, append-only)
//! 4. Write through the train store

use crate::db::TrainDb;
use crate::error::{AppError, Result};
use crate::models::train::{check_membership, expiry_for};
use crate::models::{Participant, Platform, Train, TrainStats, TrainUpdate};
use crate::services::profile::ProfileResolver;
use crate::services::username::extract_username;
use crate::time_utils::{system_clock, Clock};
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ID_LENGTH: usize = 6;
/// Fresh ids to try before giving up on a create.
const MAX_ID_ATTEMPTS: usize = 5;

/// Orchestrates every train mutation.
#[derive(Clone)]
pub struct TrainService {
    db: TrainDb,
    profiles: ProfileResolver,
    clock: Clock,
}

impl TrainService {
    pub fn new(db: TrainDb, profiles: ProfileResolver) -> Self {
        Self {
            db,
            profiles,
            clock: system_clock(),
        }
    }

    /// Replace the wall clock (tests).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Start a train hosted by the profile behind `raw_input`.
    pub async fn create_train(
        &self,
        platform: Platform,
        raw_input: &str,
        name: Option<&str>,
    ) -> Result<Train> {
        let username = extract_username(raw_input, platform).ok_or(AppError::InvalidInput)?;
        let profile = self.profiles.resolve(&username, platform).await;
        let name = train_name(name, platform);

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let now = self.now();
            let host = Participant::from_profile(profile.clone(), true, now);
            let train = Train::new(generate_train_id()?, name.clone(), platform, host, now);

            match self.db.create_train(&train).await {
                Ok(created) => {
                    tracing::info!(
                        train_id = %created.id,
                        %platform,
                        host = %username,
                        "Train created"
                    );
                    return Ok(created);
                }
                Err(AppError::Conflict(_)) => {
                    tracing::warn!(attempt, train_id = %train.id, "Train id collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "could not allocate a unique train id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }

    /// Add the profile behind `raw_input` to the end of a train.
    pub async fn join_train(&self, train_id: &str, raw_input: &str) -> Result<Train> {
        let train = self.get_train(train_id).await?;

        let username =
            extract_username(raw_input, train.platform).ok_or(AppError::InvalidInput)?;
        if train.has_participant(&username) {
            return Err(AppError::DuplicateParticipant);
        }

        let profile = self.profiles.resolve(&username, train.platform).await;
        let now = self.now();
        let participant = Participant::from_profile(profile, false, now);

        // The store re-checks expiry and uniqueness against the locked row.
        let updated = self
            .db
            .append_participant(train_id, participant, now)
            .await?;

        tracing::info!(
            train_id,
            username = %username,
            participants = updated.participants.len(),
            "Participant joined"
        );
        Ok(updated)
    }

    /// Fetch a live train.
    pub async fn get_train(&self, train_id: &str) -> Result<Train> {
        self.db
            .get_train(train_id, self.now())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Store a client-assembled train after validating it.
    ///
    /// Timestamps are always assigned here, never taken from the client.
    pub async fn import_train(
        &self,
        id: String,
        name: Option<&str>,
        platform: Platform,
        participants: Vec<Participant>,
    ) -> Result<Train> {
        let participants = canonical_participants(participants, platform)?;
        check_membership(&participants).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let now = self.now();
        let participants = participants
            .into_iter()
            .map(|p| Participant { joined_at: now, ..p })
            .collect();
        let train = Train {
            id,
            name: train_name(name, platform),
            platform,
            participants,
            created_at: now,
            updated_at: now,
            expires_at: expiry_for(now),
            version: 1,
        };

        let created = self.db.create_train(&train).await?;
        tracing::info!(train_id = %created.id, %platform, "Train imported");
        Ok(created)
    }

    /// Apply a partial update to a live train.
    ///
    /// Usernames are canonicalized here; the membership and append-only
    /// rules are enforced by the store against the row it is about to write.
    pub async fn update_train(&self, train_id: &str, update: TrainUpdate) -> Result<Train> {
        let current = self.get_train(train_id).await?;

        let update = TrainUpdate {
            participants: update
                .participants
                .map(|next| canonical_participants(next, current.platform))
                .transpose()?,
            expected_version: update.expected_version,
        };
        self.db.update_train(train_id, update, self.now()).await
    }

    pub async fn stats(&self) -> Result<TrainStats> {
        self.db.train_stats(self.now()).await
    }
}

fn train_name(name: Option<&str>, platform: Platform) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| platform.default_train_name())
}

/// Re-extract every username so stored handles are canonical for `platform`.
fn canonical_participants(
    participants: Vec<Participant>,
    platform: Platform,
) -> Result<Vec<Participant>> {
    participants
        .into_iter()
        .map(|p| {
            let username = extract_username(&p.username, platform).ok_or_else(|| {
                AppError::BadRequest(format!("invalid participant username: {:?}", p.username))
            })?;
            let display_name = if p.display_name.trim().is_empty() {
                username.clone()
            } else {
                p.display_name
            };
            Ok(Participant {
                username,
                display_name,
                ..p
            })
        })
        .collect()
}

/// Short, URL-safe, uppercase alphanumeric train id.
pub fn generate_train_id() -> Result<String> {
    let rng = SystemRandom::new();
    // Largest multiple of the alphabet size that fits in a byte; bytes at or
    // above it are rejected so every character is equally likely.
    let limit = 256 - (256 % ID_ALPHABET.len());
    let mut id = String::with_capacity(ID_LENGTH);
    let mut buf = [0u8; 16];

    while id.len() < ID_LENGTH {
        rng.fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG unavailable")))?;
        for &byte in buf.iter().filter(|&&b| usize::from(b) < limit) {
            if id.len() == ID_LENGTH {
                break;
            }
            id.push(char::from(ID_ALPHABET[usize::from(byte) % ID_ALPHABET.len()]));
        }
    }
    Ok(id)
}
