//! Common helpers for the HTTP integration tests.
//!
//! The router runs over the in-memory store, so these tests need no database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use domain::models::Question;
use domain::services::{MockNotificationService, TriviaService};
use domain::store::{EventStore, InMemoryEventStore};
use eventops_api::{app::create_app, config::Config};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const EVENT_DAY: &str = "2026-02-27";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryEventStore>,
    pub notifier: Arc<MockNotificationService>,
}

pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut all = vec![("database.url", "postgres://unused@localhost/unused")];
    all.extend_from_slice(overrides);
    Config::load_for_test(&all).expect("test config")
}

/// Router over a fresh store with the default trivia questions seeded.
pub async fn spawn_app(overrides: &[(&str, &str)]) -> TestApp {
    let store = Arc::new(InMemoryEventStore::new());
    let notifier = Arc::new(MockNotificationService::new());
    TriviaService::new(store.clone())
        .seed_default_questions()
        .await
        .expect("seed questions");

    let router = create_app(test_config(overrides), store.clone(), notifier.clone());
    TestApp {
        router,
        store,
        notifier,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(get_request(uri)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response {
        self.send(json_request(Method::POST, uri, body)).await
    }

    pub async fn questions(&self) -> Vec<Question> {
        self.store.list_questions().await.unwrap()
    }

    /// Registers a pair and returns both participant ids.
    pub async fn register_pair(&self, email1: &str, email2: &str) -> (Uuid, Uuid) {
        let response = self
            .post(
                "/escaperoom/api/users/register-multiple",
                json!({ "users": [person(email1), person(email2)] }),
            )
            .await;
        assert_eq!(response.status(), 201);
        let body = parse_response_body(response).await;
        (
            body["users"][0]["id"].as_str().unwrap().parse().unwrap(),
            body["users"][1]["id"].as_str().unwrap().parse().unwrap(),
        )
    }

    /// Submits every correct answer for `user_id`.
    pub async fn pass_trivia(&self, user_id: Uuid) {
        let answers: Vec<Value> = self
            .questions()
            .await
            .iter()
            .map(|q| {
                let correct = q.answers.iter().find(|a| a.is_correct).unwrap();
                json!({ "questionId": q.id, "answerId": correct.id })
            })
            .collect();
        let response = self
            .post(
                "/escaperoom/api/trivia/validate",
                json!({ "userId": user_id, "answers": answers }),
            )
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(parse_response_body(response).await["correct"], true);
    }

    /// Configures three event days from 10:00 to 12:00 in 30 minute slots and
    /// generates them. Returns the generated slot ids on `EVENT_DAY`.
    pub async fn generate_slots(&self) -> Vec<Uuid> {
        let response = self
            .post(
                "/escaperoom/api/admin/timeslot-config",
                json!({
                    "eventDates": [EVENT_DAY, "2026-02-28", "2026-03-01"],
                    "durationMinutes": 30,
                    "startHour": 10,
                    "endHour": 12,
                    "adminEmail": "admin@example.com"
                }),
            )
            .await;
        assert_eq!(response.status(), 200);

        let response = self
            .post("/escaperoom/api/admin/generate-timeslots", json!({}))
            .await;
        assert_eq!(response.status(), 200);

        let response = self
            .get(&format!("/escaperoom/api/timeslots?date={}", EVENT_DAY))
            .await;
        parse_response_body(response)
            .await
            .as_array()
            .unwrap()
            .iter()
            .map(|slot| slot["id"].as_str().unwrap().parse().unwrap())
            .collect()
    }
}

pub fn person(email: &str) -> Value {
    json!({
        "firstName": FirstName().fake::<String>() + "a",
        "lastName": LastName().fake::<String>() + "a",
        "email": email,
        "whatsapp": "0991234567"
    })
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn parse_response_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
