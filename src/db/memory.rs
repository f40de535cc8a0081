// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory train store.
//!
//! Each operation holds the shard lock for its key, so appends to the same
//! train are serialized and never lost.

use super::{apply_append, apply_update};
use crate::error::AppError;
use crate::models::{Participant, Train, TrainStats, TrainUpdate};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryDb {
    trains: Arc<DashMap<String, Train>>,
}

impl MemoryDb {
    pub fn create_train(&self, train: &Train) -> Result<Train, AppError> {
        match self.trains.entry(train.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "train id {} already exists",
                train.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(train.clone());
                Ok(train.clone())
            }
        }
    }

    pub fn get_train(&self, id: &str, now: DateTime<Utc>) -> Option<Train> {
        self.trains
            .get(id)
            .map(|entry| entry.value().clone())
            .filter(|train| !train.is_expired(now))
    }

    pub fn update_train(
        &self,
        id: &str,
        update: TrainUpdate,
        now: DateTime<Utc>,
    ) -> Result<Train, AppError> {
        let mut entry = self.trains.get_mut(id).ok_or(AppError::NotFound)?;
        apply_update(entry.value_mut(), update, now)?;
        Ok(entry.value().clone())
    }

    pub fn append_participant(
        &self,
        id: &str,
        participant: Participant,
        now: DateTime<Utc>,
    ) -> Result<Train, AppError> {
        let mut entry = self.trains.get_mut(id).ok_or(AppError::NotFound)?;
        apply_append(entry.value_mut(), participant, now)?;
        Ok(entry.value().clone())
    }

    pub fn train_stats(&self, now: DateTime<Utc>) -> TrainStats {
        let trains: Vec<Train> = self
            .trains
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        TrainStats::from_rows(&trains, now)
    }
}
