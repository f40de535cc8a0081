// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregate counts over active (non-expired) trains.

use crate::models::{Platform, Train};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrainStats {
    pub total_trains: u64,
    /// Active trains created in the last 24 hours
    #[serde(rename = "trainsLast24h")]
    pub trains_last_24h: u64,
    /// Sorted by count descending, then platform id
    pub platforms: Vec<PlatformCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlatformCount {
    pub platform: Platform,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub count: u64,
}

/// The fields the stats query needs from a stored train.
pub trait StatsRow {
    fn platform(&self) -> Platform;
    fn created_at(&self) -> DateTime<Utc>;
    fn expires_at(&self) -> DateTime<Utc>;
}

impl StatsRow for Train {
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

impl TrainStats {
    /// Aggregate rows, skipping anything already expired at `now`.
    pub fn from_rows<'a, R, I>(rows: I, now: DateTime<Utc>) -> Self
    where
        R: StatsRow + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let day_ago = now - Duration::hours(24);
        let mut stats = TrainStats::default();
        let mut by_platform: HashMap<Platform, u64> = HashMap::new();

        for row in rows.into_iter().filter(|r| now <= r.expires_at()) {
            stats.total_trains += 1;
            if row.created_at() > day_ago {
                stats.trains_last_24h += 1;
            }
            *by_platform.entry(row.platform()).or_insert(0) += 1;
        }

        stats.platforms = by_platform
            .into_iter()
            .map(|(platform, count)| PlatformCount { platform, count })
            .collect();
        stats.platforms.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.platform.id().cmp(b.platform.id()))
        });
        stats
    }
}
