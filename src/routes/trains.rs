// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Train routes: create, fetch, update, join.

use super::{json_body, validated_json_body};
use crate::error::Result;
use crate::models::{Participant, Platform, Train, TrainUpdate};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::{Validate, ValidationError};

/// Train routes (public; the train id is the only access key).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trains", post(create_train))
        .route("/api/trains/new", post(start_train))
        .route("/api/trains/{id}", get(get_train).patch(update_train))
        .route("/api/trains/{id}/join", post(join_train))
}

// ─── Raw Create ──────────────────────────────────────────────

/// Client-assembled train. Timestamps, if sent, are ignored.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateTrainRequest {
    #[validate(
        length(min = 1, max = 32),
        custom(function = "validate_train_id")
    )]
    id: String,
    #[validate(length(max = 100))]
    name: Option<String>,
    platform: Platform,
    #[validate(length(min = 1))]
    participants: Vec<Participant>,
}

fn validate_train_id(id: &str) -> std::result::Result<(), ValidationError> {
    if id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("train_id_charset"))
    }
}

/// Store a train built by the client.
async fn create_train(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<CreateTrainRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Train>)> {
    let req = validated_json_body(payload)?;

    let train = state
        .trains
        .import_train(req.id, req.name.as_deref(), req.platform, req.participants)
        .await?;

    Ok((StatusCode::CREATED, Json(train)))
}

// ─── Service-side Create / Join ──────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct StartTrainRequest {
    platform: Platform,
    /// Profile URL or handle of the host
    #[validate(length(max = 512))]
    input: String,
    #[validate(length(max = 100))]
    name: Option<String>,
}

/// Start a train from a profile URL or handle.
async fn start_train(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<StartTrainRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Train>)> {
    let req = validated_json_body(payload)?;

    let train = state
        .trains
        .create_train(req.platform, &req.input, req.name.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(train)))
}

#[derive(Debug, Deserialize, Validate)]
struct JoinTrainRequest {
    #[validate(length(max = 512))]
    input: String,
}

/// Join an existing train.
async fn join_train(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<JoinTrainRequest>, JsonRejection>,
) -> Result<Json<Train>> {
    let req = validated_json_body(payload)?;
    let train = state.trains.join_train(&id, &req.input).await?;
    Ok(Json(train))
}

// ─── Read / Update ───────────────────────────────────────────

async fn get_train(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Train>> {
    Ok(Json(state.trains.get_train(&id).await?))
}

/// Partial update; in practice `{participants: [...]}`.
async fn update_train(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<TrainUpdate>, JsonRejection>,
) -> Result<Json<Train>> {
    let update = json_body(payload)?;
    tracing::debug!(
        train_id = %id,
        participants = ?update.participants.as_ref().map(Vec::len),
        expected_version = ?update.expected_version,
        "Updating train"
    );
    Ok(Json(state.trains.update_train(&id, update).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_id_charset() {
        assert!(validate_train_id("ABC123").is_ok());
        assert!(validate_train_id("my-train_2").is_ok());
        assert!(validate_train_id("has space").is_err());
        assert!(validate_train_id("slash/id").is_err());
    }

    #[test]
    fn test_create_request_validation() {
        let ok: CreateTrainRequest = serde_json::from_value(serde_json::json!({
            "id": "ABC123",
            "platform": "twitter",
            "participants": [{"username": "alice", "isHost": true}]
        }))
        .unwrap();
        assert!(ok.validate().is_ok());

        let empty: CreateTrainRequest = serde_json::from_value(serde_json::json!({
            "id": "",
            "platform": "twitter",
            "participants": []
        }))
        .unwrap();
        let errors = empty.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("id"));
        assert!(fields.contains_key("participants"));
    }
}
