// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod trains;

use crate::error::{AppError, Result};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: format_utc_rfc3339(chrono::Utc::now()),
        build_id,
    })
}

/// Unwrap a JSON body, reporting malformed or incomplete input as 400
/// (axum would otherwise answer 422 for missing fields).
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    let Json(body) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(body)
}

/// Like [`json_body`], then run the body's field validators.
pub(crate) fn validated_json_body<T: Validate>(
    payload: std::result::Result<Json<T>, JsonRejection>,
) -> Result<T> {
    let body = json_body(payload)?;
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(body)
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .merge(trains::routes())
        .merge(api::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
