//! Escape room flow through the HTTP surface.
//!
//! Tests cover:
//! - group registration and lookup
//! - trivia gate in front of booking
//! - paired booking, group check-in, rating and export
//! - capacity and duplicate-booking rejections

mod common;

use common::{parse_response_body, spawn_app, EVENT_DAY};
use serde_json::json;

#[tokio::test]
async fn test_register_pair_and_search() {
    let app = spawn_app(&[]).await;
    let (a, b) = app.register_pair("ana@example.com", "luis@example.com").await;

    let response = app
        .get("/escaperoom/api/users/search?email=ANA@example.com")
        .await;
    assert_eq!(response.status(), 200);
    let body = parse_response_body(response).await;
    assert_eq!(body["id"], a.to_string());
    assert_eq!(body["partner"]["id"], b.to_string());
    assert!(body["reservation"].is_null());
}

#[tokio::test]
async fn test_register_rejects_single_person() {
    let app = spawn_app(&[]).await;
    let response = app
        .post(
            "/escaperoom/api/users/register-multiple",
            json!({ "users": [common::person("solo@example.com")] }),
        )
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(parse_response_body(response).await["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_register_twice_is_conflict() {
    let app = spawn_app(&[]).await;
    app.register_pair("ana@example.com", "luis@example.com").await;

    let response = app
        .post(
            "/escaperoom/api/users/register-multiple",
            json!({ "users": [common::person("ana@example.com"), common::person("new@example.com")] }),
        )
        .await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = spawn_app(&[]).await;
    let response = app
        .post("/escaperoom/api/reservations", json!({ "userId": "not-a-uuid" }))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(parse_response_body(response).await["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_questions_hide_correct_flag() {
    let app = spawn_app(&[]).await;
    let response = app.get("/escaperoom/api/trivia/questions").await;
    assert_eq!(response.status(), 200);
    let body = parse_response_body(response).await;
    let questions = body.as_array().unwrap();
    assert_eq!(questions.len(), 5);
    assert!(questions[0]["answers"][0].get("isCorrect").is_none());
}

#[tokio::test]
async fn test_booking_requires_trivia() {
    let app = spawn_app(&[]).await;
    let slots = app.generate_slots().await;
    let (a, _) = app.register_pair("ana@example.com", "luis@example.com").await;

    let response = app
        .post(
            "/escaperoom/api/reservations",
            json!({ "userId": a, "timeslotId": slots[0] }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_single_booking_and_second_booking_conflict() {
    let app = spawn_app(&[]).await;
    let slots = app.generate_slots().await;
    assert_eq!(slots.len(), 4);
    let (a, _) = app.register_pair("ana@example.com", "luis@example.com").await;
    app.pass_trivia(a).await;

    let response = app
        .post(
            "/escaperoom/api/reservations",
            json!({ "userId": a, "timeslotId": slots[0] }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "RESERVED");
    assert!(body["qrCode"].as_str().is_some());
    assert_eq!(app.notifier.sent_to(), vec!["ana@example.com".to_string()]);

    let response = app
        .post(
            "/escaperoom/api/reservations",
            json!({ "userId": a, "timeslotId": slots[1] }),
        )
        .await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_pair_booking_needs_two_seats() {
    let app = spawn_app(&[]).await;
    let slots = app.generate_slots().await;
    let (a, b) = app.register_pair("ana@example.com", "luis@example.com").await;
    app.pass_trivia(a).await;

    let response = app
        .post(
            "/escaperoom/api/reservations/multiple",
            json!({ "userId": a, "partnerId": b, "timeslotId": slots[0] }),
        )
        .await;
    assert_eq!(response.status(), 409);
    assert_eq!(
        parse_response_body(response).await["error"],
        "CAPACITY_EXCEEDED"
    );
}

#[tokio::test]
async fn test_full_pair_flow() {
    let app = spawn_app(&[("event.default_slot_capacity", "2")]).await;
    let slots = app.generate_slots().await;
    let (a, b) = app.register_pair("ana@example.com", "luis@example.com").await;
    app.pass_trivia(a).await;

    // Book both seats
    let response = app
        .post(
            "/escaperoom/api/reservations/multiple",
            json!({ "userId": a, "partnerId": b, "timeslotId": slots[0] }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let booked = parse_response_body(response).await;
    let qr1 = booked[0]["qrCode"].as_str().unwrap().to_string();
    let qr2 = booked[1]["qrCode"].as_str().unwrap().to_string();
    assert_eq!(app.notifier.sent_to().len(), 2);

    let response = app
        .get(&format!("/escaperoom/api/timeslots?date={}", EVENT_DAY))
        .await;
    let availability = parse_response_body(response).await;
    let first = availability
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == slots[0].to_string())
        .unwrap();
    assert_eq!(first["reservedCount"], 2);
    assert_eq!(first["isAvailable"], false);

    // Move the pair, then check in together
    let response = app
        .post(
            "/escaperoom/api/checkin/group/reassign",
            json!({ "qrCode1": qr1, "qrCode2": qr2, "newTimeslotId": slots[1] }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .post("/escaperoom/api/checkin/validate", json!({ "qrCode": qr1 }))
        .await;
    let details = parse_response_body(response).await;
    assert_eq!(details["timeslotId"], slots[1].to_string());
    assert_eq!(details["status"], "RESERVED");

    let response = app
        .post(
            "/escaperoom/api/checkin/group/checkin",
            json!({ "qrCode1": qr1, "qrCode2": qr2 }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let result = parse_response_body(response).await;
    assert_eq!(result["reservations"][0]["status"], "USED");
    assert_eq!(result["reservations"][1]["status"], "USED");

    // A used QR cannot be checked in or cancelled again
    let response = app
        .post("/escaperoom/api/checkin/confirm", json!({ "qrCode": qr1 }))
        .await;
    assert_eq!(response.status(), 409);
    let response = app
        .post("/escaperoom/api/checkin/cancel", json!({ "qrCode": qr1 }))
        .await;
    assert_eq!(parse_response_body(response).await["error"], "ALREADY_USED");

    // Rate the pair
    let response = app.get("/escaperoom/api/checkin/groups/checked-in").await;
    let groups = parse_response_body(response).await;
    assert_eq!(groups.as_array().unwrap().len(), 1);
    let id1 = groups[0]["members"][0]["reservationId"].clone();
    let id2 = groups[0]["members"][1]["reservationId"].clone();

    let response = app
        .post(
            "/escaperoom/api/checkin/groups/rate",
            json!({ "reservationId1": id1, "reservationId2": id2, "rating": 3 }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .post(
            "/escaperoom/api/checkin/groups/rate",
            json!({ "reservationId1": id1, "reservationId2": id2, "rating": 7 }),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Export reflects everything
    let response = app.get("/escaperoom/api/admin/users-data").await;
    let rows = parse_response_body(response).await;
    let row = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["email"] == "ana@example.com")
        .unwrap();
    assert_eq!(row["reservationStatus"], "USED");
    assert_eq!(row["checkedIn"], true);
    assert_eq!(row["interestRating"], 3);
    assert_eq!(row["interestLevel"], "Bastante interesado");
    assert_eq!(row["timeslot"], "10:30 - 11:00");
}

#[tokio::test]
async fn test_cancel_frees_the_seat() {
    let app = spawn_app(&[]).await;
    let slots = app.generate_slots().await;
    let (a, _) = app.register_pair("ana@example.com", "luis@example.com").await;
    let (c, _) = app.register_pair("carla@example.com", "dario@example.com").await;
    app.pass_trivia(a).await;
    app.pass_trivia(c).await;

    let response = app
        .post(
            "/escaperoom/api/reservations",
            json!({ "userId": a, "timeslotId": slots[0] }),
        )
        .await;
    let qr = parse_response_body(response).await["qrCode"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .post(
            "/escaperoom/api/reservations",
            json!({ "userId": c, "timeslotId": slots[0] }),
        )
        .await;
    assert_eq!(response.status(), 409);

    let response = app
        .post("/escaperoom/api/checkin/cancel", json!({ "qrCode": qr }))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(parse_response_body(response).await["status"], "CANCELLED");

    let response = app
        .post(
            "/escaperoom/api/reservations",
            json!({ "userId": c, "timeslotId": slots[0] }),
        )
        .await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_unknown_qr_is_not_found() {
    let app = spawn_app(&[]).await;
    let response = app
        .post(
            "/escaperoom/api/checkin/confirm",
            json!({ "qrCode": "does-not-exist" }),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_resend_confirmation() {
    let app = spawn_app(&[]).await;
    let slots = app.generate_slots().await;
    let (a, _) = app.register_pair("ana@example.com", "luis@example.com").await;
    app.pass_trivia(a).await;
    app.post(
        "/escaperoom/api/reservations",
        json!({ "userId": a, "timeslotId": slots[0] }),
    )
    .await;

    let response = app
        .post(
            "/escaperoom/api/reservations/resend",
            json!({ "email": "ana@example.com" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(app.notifier.sent_to().len(), 2);
}

#[tokio::test]
async fn test_availability_requires_date() {
    let app = spawn_app(&[]).await;
    let response = app.get("/escaperoom/api/timeslots").await;
    assert_eq!(response.status(), 400);
    let response = app.get("/escaperoom/api/timeslots?date=27-02-2026").await;
    assert_eq!(response.status(), 400);
}
