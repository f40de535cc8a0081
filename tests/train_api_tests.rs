// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Train lifecycle through the HTTP API, backed by the in-memory store.

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, create_test_app_with_clock, get, json_request, TestClock};

/// Start a Twitter train hosted by alice and return its id.
async fn start_alice_train(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/trains/new",
            json!({"platform": "twitter", "input": "https://twitter.com/alice"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// START / JOIN
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_start_train_from_url() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/trains/new",
            json!({"platform": "twitter", "input": "https://twitter.com/alice"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let train = body_json(response).await;
    let id = train["id"].as_str().unwrap();
    assert_eq!(id.len(), 6);
    assert!(id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(train["name"], "Twitter/X Train");
    assert_eq!(train["platform"], "twitter");
    assert_eq!(train["version"], 1);

    let participants = train["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["username"], "alice");
    assert_eq!(participants[0]["displayName"], "Alice");
    assert_eq!(participants[0]["isHost"], true);
    assert_eq!(participants[0]["isVerified"], false);
}

#[tokio::test]
async fn test_start_train_timestamps_and_ttl() {
    let clock = TestClock::new();
    let (app, _state) = create_test_app_with_clock(&clock);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/trains/new",
            json!({"platform": "instagram", "input": "@Carol.Art", "name": "Art crowd"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let train = body_json(response).await;
    assert_eq!(train["name"], "Art crowd");
    assert_eq!(train["participants"][0]["username"], "Carol.Art");
    assert_eq!(train["createdAt"], "2026-03-01T12:00:00.000Z");
    assert_eq!(train["updatedAt"], "2026-03-01T12:00:00.000Z");
    assert_eq!(train["expiresAt"], "2026-03-08T12:00:00.000Z");
}

#[tokio::test]
async fn test_start_train_invalid_input() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/trains/new",
            json!({"platform": "twitter", "input": "@"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn test_start_train_unknown_platform() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/trains/new",
            json!({"platform": "myspace", "input": "tom"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_appends_in_order() {
    let (app, _state) = create_test_app();
    let id = start_alice_train(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/trains/{}/join", id),
            json!({"input": "https://x.com/bob?ref=share"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let train = body_json(response).await;
    let participants = train["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2);
    assert_eq!(participants[0]["username"], "alice");
    assert_eq!(participants[1]["username"], "bob");
    assert_eq!(participants[1]["isHost"], false);

    // A later read returns the same order
    let response = app
        .oneshot(get(&format!("/api/trains/{}", id)))
        .await
        .unwrap();
    let fetched = body_json(response).await;
    assert_eq!(fetched["participants"], train["participants"]);
}

#[tokio::test]
async fn test_join_duplicate_is_conflict() {
    let (app, _state) = create_test_app();
    let id = start_alice_train(&app).await;

    for input in ["alice", "@ALICE", "https://twitter.com/Alice"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/trains/{}/join", id),
                json!({ "input": input }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT, "input {:?}", input);
        let body = body_json(response).await;
        assert_eq!(body["error"], "duplicate_participant");
    }

    let response = app
        .oneshot(get(&format!("/api/trains/{}", id)))
        .await
        .unwrap();
    let train = body_json(response).await;
    assert_eq!(train["participants"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_join_invalid_input() {
    let (app, _state) = create_test_app();
    let id = start_alice_train(&app).await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/trains/{}/join", id),
            json!({"input": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_unknown_train() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/trains/NOPE42/join",
            json!({"input": "bob"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════════════════════
// FETCH / EXPIRY
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_get_unknown_train() {
    let (app, _state) = create_test_app();

    let response = app.oneshot(get("/api/trains/ZZZZZZ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "Train not found");
}

#[tokio::test]
async fn test_train_alive_at_expiry_instant() {
    let clock = TestClock::new();
    let (app, _state) = create_test_app_with_clock(&clock);
    let id = start_alice_train(&app).await;

    clock.advance(Duration::days(7));

    let response = app
        .oneshot(get(&format!("/api/trains/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_train_looks_missing() {
    let clock = TestClock::new();
    let (app, _state) = create_test_app_with_clock(&clock);
    let id = start_alice_train(&app).await;

    clock.advance(Duration::days(7) + Duration::milliseconds(1));

    let response = app
        .clone()
        .oneshot(get(&format!("/api/trains/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["details"], "Train not found");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/trains/{}/join", id),
            json!({"input": "bob"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/trains/{}", id),
            json!({"participants": [{"username": "alice", "isHost": true}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════════════════════
// RAW CREATE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_missing_fields() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/trains",
            json!({"id": "ABC123", "platform": "twitter"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_malformed_json() {
    let (app, _state) = create_test_app();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/trains")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_and_fetch() {
    let clock = TestClock::new();
    let (app, _state) = create_test_app_with_clock(&clock);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/trains",
            json!({
                "id": "CLIENT1",
                "platform": "tiktok",
                "participants": [
                    {"username": "@Dancer", "displayName": "Dancer", "isHost": true},
                    {"username": "https://www.tiktok.com/@mover.2", "followers": 12}
                ],
                "createdAt": "1999-01-01T00:00:00.000Z",
                "expiresAt": "2999-01-01T00:00:00.000Z"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["id"], "CLIENT1");
    assert_eq!(created["name"], "TikTok Train");
    assert_eq!(created["participants"][0]["username"], "Dancer");
    assert_eq!(created["participants"][1]["username"], "mover.2");
    assert_eq!(created["participants"][1]["displayName"], "mover.2");
    assert_eq!(created["participants"][1]["followers"], 12);
    // Server-assigned, client values ignored
    assert_eq!(created["createdAt"], "2026-03-01T12:00:00.000Z");
    assert_eq!(created["participants"][0]["joinedAt"], "2026-03-01T12:00:00.000Z");
    assert_eq!(created["participants"][1]["joinedAt"], "2026-03-01T12:00:00.000Z");
    assert_eq!(created["expiresAt"], "2026-03-08T12:00:00.000Z");

    let response = app.oneshot(get("/api/trains/CLIENT1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, created);
}

#[tokio::test]
async fn test_create_duplicate_id() {
    let (app, _state) = create_test_app();
    let body = json!({
        "id": "SAME01",
        "platform": "telegram",
        "participants": [{"username": "host_one", "isHost": true}]
    });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/trains", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request("POST", "/api/trains", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_rejects_bad_membership() {
    let (app, _state) = create_test_app();

    let cases = [
        // empty
        json!([]),
        // host not first
        json!([{"username": "a"}, {"username": "b", "isHost": true}]),
        // two hosts
        json!([{"username": "a", "isHost": true}, {"username": "b", "isHost": true}]),
        // same user twice, different case
        json!([{"username": "alice", "isHost": true}, {"username": "ALICE"}]),
        // nothing usable after extraction
        json!([{"username": "@", "isHost": true}]),
    ];

    for participants in cases {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/trains",
                json!({"id": "BAD001", "platform": "twitter", "participants": participants}),
            ))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "participants {}",
            participants
        );
    }
}

#[tokio::test]
async fn test_create_rejects_bad_id() {
    let (app, _state) = create_test_app();

    let too_long = "X".repeat(33);
    for id in ["", "has space", too_long.as_str()] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/trains",
                json!({
                    "id": id,
                    "platform": "twitter",
                    "participants": [{"username": "alice", "isHost": true}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "id {:?}", id);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PATCH
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_patch_appends_participant() {
    let clock = TestClock::new();
    let (app, _state) = create_test_app_with_clock(&clock);
    let id = start_alice_train(&app).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/trains/{}", id)))
        .await
        .unwrap();
    let mut participants = body_json(response).await["participants"].clone();
    participants
        .as_array_mut()
        .unwrap()
        .push(json!({
            "username": "dave",
            "displayName": "Dave",
            "joinedAt": "2001-01-01T00:00:00.000Z"
        }));

    clock.advance(Duration::minutes(5));

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/trains/{}", id),
            json!({ "participants": participants, "expectedVersion": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let train = body_json(response).await;
    assert_eq!(train["version"], 2);
    assert_eq!(train["participants"][1]["username"], "dave");
    assert_eq!(train["participants"][1]["joinedAt"], "2026-03-01T12:05:00.000Z");
    assert_eq!(train["participants"][0]["joinedAt"], "2026-03-01T12:00:00.000Z");
    assert_eq!(train["createdAt"], "2026-03-01T12:00:00.000Z");
    assert_eq!(train["updatedAt"], "2026-03-01T12:05:00.000Z");
    // Expiry is fixed at creation
    assert_eq!(train["expiresAt"], "2026-03-08T12:00:00.000Z");
}

#[tokio::test]
async fn test_patch_stale_version() {
    let (app, _state) = create_test_app();
    let id = start_alice_train(&app).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/trains/{}", id),
            json!({
                "participants": [{"username": "alice", "isHost": true}, {"username": "eve"}],
                "expectedVersion": 7
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_patch_cannot_drop_participants() {
    let (app, _state) = create_test_app();
    let id = start_alice_train(&app).await;

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/trains/{}/join", id),
            json!({"input": "bob"}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/trains/{}", id),
            json!({"participants": [{"username": "alice", "isHost": true}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_unknown_train() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/trains/NOPE99",
            json!({"participants": [{"username": "alice", "isHost": true}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_rejects_unknown_fields() {
    let (app, _state) = create_test_app();
    let id = start_alice_train(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/trains/{}", id),
            json!({"name": "Renamed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get(&format!("/api/trains/{}", id)))
        .await
        .unwrap();
    let train = body_json(response).await;
    assert_eq!(train["name"], "Twitter/X Train");
    assert_eq!(train["version"], 1);
}

#[tokio::test]
async fn test_patch_from_stale_read_keeps_later_join() {
    let (app, _state) = create_test_app();
    let id = start_alice_train(&app).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/trains/{}", id)))
        .await
        .unwrap();
    let mut participants = body_json(response).await["participants"].clone();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/trains/{}/join", id),
            json!({"input": "carol"}),
        ))
        .await
        .unwrap();

    participants
        .as_array_mut()
        .unwrap()
        .push(json!({"username": "bob"}));
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/trains/{}", id),
            json!({ "participants": participants }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get(&format!("/api/trains/{}", id)))
        .await
        .unwrap();
    let train = body_json(response).await;
    let names: Vec<&str> = train["participants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["alice", "carol"]);
}
