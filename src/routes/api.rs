// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only API routes: profile lookup, stats, platform catalogue.

use crate::error::{AppError, Result};
use crate::models::{Platform, PlatformInfo, Profile, TrainStats, PLATFORMS};
use crate::services::extract_username;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile/{platform}/{username}", get(get_profile))
        .route("/api/stats", get(get_stats))
        .route("/api/platforms", get(list_platforms))
}

// ─── Profile Lookup ──────────────────────────────────────────

/// Resolve a profile. Platform failures come back as a fallback profile,
/// never as an error.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path((platform, username)): Path<(String, String)>,
) -> Result<Json<Profile>> {
    let platform = platform
        .parse::<Platform>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let username = extract_username(&username, platform).ok_or(AppError::InvalidInput)?;

    Ok(Json(state.profiles.resolve(&username, platform).await))
}

// ─── Stats ───────────────────────────────────────────────────

async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<TrainStats>> {
    let stats = state.trains.stats().await?;
    tracing::debug!(
        total = stats.total_trains,
        last_24h = stats.trains_last_24h,
        "Fetched train stats"
    );
    Ok(Json(stats))
}

// ─── Platforms ───────────────────────────────────────────────

async fn list_platforms() -> Json<Vec<PlatformInfo>> {
    Json(PLATFORMS.iter().map(PlatformInfo::from).collect())
}
