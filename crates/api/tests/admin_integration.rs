//! Admin routes: key guard, registration control and timeslot setup.

mod common;

use axum::body::Body;
use axum::http::{Method, Request};
use common::{parse_response_body, spawn_app, TestApp};
use serde_json::json;
use shared::crypto::sha256_hex;

const ADMIN_KEY: &str = "door-code-4417";

async fn guarded_app() -> TestApp {
    let hash = sha256_hex(ADMIN_KEY);
    spawn_app(&[("security.admin_key_hash", hash.as_str())]).await
}

fn admin_get(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(key) = key {
        builder = builder.header("X-Admin-Key", key);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_admin_routes_require_key_when_configured() {
    let app = guarded_app().await;

    let response = app
        .send(admin_get("/escaperoom/api/admin/registration-status", None))
        .await;
    assert_eq!(response.status(), 401);
    assert_eq!(parse_response_body(response).await["error"], "UNAUTHORIZED");

    let response = app
        .send(admin_get(
            "/escaperoom/api/admin/registration-status",
            Some("wrong"),
        ))
        .await;
    assert_eq!(response.status(), 401);

    let response = app
        .send(admin_get(
            "/escaperoom/api/admin/registration-status",
            Some(ADMIN_KEY),
        ))
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_public_routes_skip_admin_key() {
    let app = guarded_app().await;
    let response = app.get("/escaperoom/api/trivia/questions").await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_registration_control_lifecycle() {
    let app = spawn_app(&[]).await;

    let response = app.get("/escaperoom/api/admin/registration-status").await;
    let status = parse_response_body(response).await;
    assert!(status["manualOverride"].is_null());

    let response = app
        .post(
            "/escaperoom/api/admin/registration-control",
            json!({ "isOpen": false, "reason": "Full", "adminEmail": "admin@example.com" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.get("/escaperoom/api/admin/registration-status").await;
    let status = parse_response_body(response).await;
    assert_eq!(status["manualOverride"], false);
    assert_eq!(status["reason"], "Full");

    let response = app
        .send(
            Request::builder()
                .method(Method::DELETE)
                .uri("/escaperoom/api/admin/registration-control")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.get("/escaperoom/api/admin/registration-status").await;
    assert!(parse_response_body(response).await["manualOverride"].is_null());
}

#[tokio::test]
async fn test_timeslot_config_round() {
    let app = spawn_app(&[]).await;
    app.generate_slots().await;

    let response = app.get("/escaperoom/api/admin/timeslot-config").await;
    let config = parse_response_body(response).await;
    assert_eq!(config["slotsPerDay"], 4);
    assert_eq!(config["eventDates"].as_array().unwrap().len(), 3);

    let response = app.get("/escaperoom/api/admin/registration-status").await;
    assert_eq!(parse_response_body(response).await["durationMinutes"], 30);
}

#[tokio::test]
async fn test_invalid_timeslot_config() {
    let app = spawn_app(&[]).await;
    let response = app
        .post(
            "/escaperoom/api/admin/timeslot-config",
            json!({
                "eventDates": ["2026-02-27"],
                "durationMinutes": 30,
                "startHour": 14,
                "endHour": 10,
                "adminEmail": "admin@example.com"
            }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_generate_without_config() {
    let app = spawn_app(&[]).await;
    let response = app
        .post("/escaperoom/api/admin/generate-timeslots", json!({}))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_clear_timeslots_blocked_by_reservations() {
    let app = spawn_app(&[]).await;
    let slots = app.generate_slots().await;
    let (a, _) = app.register_pair("ana@example.com", "luis@example.com").await;
    app.pass_trivia(a).await;
    app.post(
        "/escaperoom/api/reservations",
        json!({ "userId": a, "timeslotId": slots[0] }),
    )
    .await;

    let delete = || {
        Request::builder()
            .method(Method::DELETE)
            .uri("/escaperoom/api/admin/timeslots")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.send(delete()).await;
    assert_eq!(response.status(), 409);

    let response = app
        .post("/escaperoom/api/admin/generate-timeslots", json!({}))
        .await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_clear_timeslots() {
    let app = spawn_app(&[]).await;
    app.generate_slots().await;

    let response = app
        .send(
            Request::builder()
                .method(Method::DELETE)
                .uri("/escaperoom/api/admin/timeslots")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(parse_response_body(response).await["deletedCount"], 12);
}
