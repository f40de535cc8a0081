// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Train model for storage and API.

use crate::models::{Platform, Profile};
use crate::time_utils::rfc3339_millis;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// How long a train lives after creation.
pub const TRAIN_TTL_DAYS: i64 = 7;

/// A shareable group of linked profiles on one platform.
///
/// Stored as one document per train; participants are embedded in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Train {
    /// Public share key (also used as document ID)
    pub id: String,
    pub name: String,
    pub platform: Platform,
    /// First entry is always the host
    pub participants: Vec<Participant>,
    #[serde(with = "rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub expires_at: DateTime<Utc>,
    /// Incremented on every update (optimistic concurrency)
    #[serde(default = "initial_version")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub version: u64,
}

fn initial_version() -> u64 {
    1
}

/// One linked profile inside a train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Participant {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub followers: u64,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_host: bool,
    #[serde(with = "rfc3339_millis", default = "Utc::now")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Build a participant from a resolved profile.
    pub fn from_profile(profile: Profile, is_host: bool, joined_at: DateTime<Utc>) -> Self {
        Self {
            username: profile.username,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar: profile.avatar,
            followers: profile.followers,
            is_verified: profile.is_verified,
            is_host,
            joined_at,
        }
    }

    /// Case-insensitive username comparison.
    pub fn same_user(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.to_lowercase()
    }
}

impl Train {
    /// A fresh train with its host as the only participant.
    pub fn new(
        id: String,
        name: String,
        platform: Platform,
        host: Participant,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            platform,
            participants: vec![Participant {
                is_host: true,
                ..host
            }],
            created_at: now,
            updated_at: now,
            expires_at: expiry_for(now),
            version: initial_version(),
        }
    }

    /// Past `expires_at`, a train reads as if it never existed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn has_participant(&self, username: &str) -> bool {
        self.participants.iter().any(|p| p.same_user(username))
    }
}

/// Expiry timestamp for a train created at `created_at`.
pub fn expiry_for(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(TRAIN_TTL_DAYS)
}

/// Partial update accepted by `PATCH /api/trains/{id}`.
///
/// Only the participant list is mutable; any other field is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrainUpdate {
    pub participants: Option<Vec<Participant>>,
    /// Reject the update unless the stored version still matches.
    pub expected_version: Option<u64>,
}

/// Violations of the participant-membership rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("a train needs at least one participant")]
    Empty,

    #[error("the first participant must be the host")]
    HostNotFirst,

    #[error("only the first participant may be the host")]
    ExtraHost,

    #[error("duplicate participant: {0}")]
    DuplicateUsername(String),

    #[error("participants may only be appended")]
    NotAppendOnly,
}

/// Check that `participants` is a valid membership list on its own.
pub fn check_membership(participants: &[Participant]) -> Result<(), MembershipError> {
    let (host, rest) = participants.split_first().ok_or(MembershipError::Empty)?;
    if !host.is_host {
        return Err(MembershipError::HostNotFirst);
    }
    if rest.iter().any(|p| p.is_host) {
        return Err(MembershipError::ExtraHost);
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for p in participants {
        if !seen.insert(p.username.to_lowercase()) {
            return Err(MembershipError::DuplicateUsername(p.username.clone()));
        }
    }
    Ok(())
}

/// Check that `next` only appends to `current`.
pub fn check_append_only(
    current: &[Participant],
    next: &[Participant],
) -> Result<(), MembershipError> {
    if next.len() < current.len() {
        return Err(MembershipError::NotAppendOnly);
    }
    let prefix_kept = current
        .iter()
        .zip(next)
        .all(|(old, new)| old.same_user(&new.username) && old.is_host == new.is_host);
    if !prefix_kept {
        return Err(MembershipError::NotAppendOnly);
    }
    Ok(())
}
