// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::{DateTime, Duration, Utc};
use follow_train::config::Config;
use follow_train::db::{FirestoreDb, TrainDb};
use follow_train::routes::create_router;
use follow_train::services::{ProfileResolver, TrainService};
use follow_train::time_utils::Clock;
use follow_train::AppState;
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Manually advanced clock shared between a test and the app under test.
#[derive(Clone)]
#[allow(dead_code)]
pub struct TestClock(Arc<Mutex<DateTime<Utc>>>);

#[allow(dead_code)]
impl TestClock {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(parse_time("2026-03-01T12:00:00Z"))))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }

    pub fn clock(&self) -> Clock {
        let inner = self.0.clone();
        Arc::new(move || *inner.lock().unwrap())
    }
}

/// Create a test app backed by the in-memory store, with no live platform
/// integrations. Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(
        AppState::new(Config::test_default(), TrainDb::in_memory())
            .expect("Failed to build app state"),
    );
    (create_router(state.clone()), state)
}

/// Test app whose store is an unconnected Firestore client, so every
/// store call fails.
#[allow(dead_code)]
pub fn create_offline_app() -> axum::Router {
    let state = Arc::new(
        AppState::new(
            Config::test_default(),
            TrainDb::Firestore(FirestoreDb::new_mock()),
        )
        .expect("Failed to build app state"),
    );
    create_router(state)
}

/// Same as [`create_test_app`], with time controlled by `clock`.
#[allow(dead_code)]
pub fn create_test_app_with_clock(clock: &TestClock) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let profiles = ProfileResolver::new(&config).expect("Failed to build profile resolver");
    let trains =
        TrainService::new(TrainDb::in_memory(), profiles.clone()).with_clock(clock.clock());

    let state = Arc::new(AppState {
        config,
        profiles,
        trains,
    });
    (create_router(state.clone()), state)
}

#[allow(dead_code)]
pub fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .unwrap()
        .with_timezone(&Utc)
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
