//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use quizgate_api::state::AppState;
use quizgate_core::clock::Clock;
use quizgate_core::repository::{
    ContentStore, LeaderboardStore, MembershipStore, ReferralStore, UserStore,
};
use quizgate_referral::domain::link::LinkBuilder;
use quizgate_store::PgStore;
use quizgate_test_support::{FixedClock, InMemoryStore};
use sqlx::PgPool;
use tower::ServiceExt;

/// The user id configured as admin in every test app.
pub const ADMIN_ID: &str = "42";

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

fn build_state<S>(store: Arc<S>) -> AppState
where
    S: UserStore + ContentStore + ReferralStore + LeaderboardStore + MembershipStore + 'static,
{
    AppState::new(
        store,
        fixed_clock(),
        LinkBuilder::new("QuizBot"),
        Some(quizgate_test_support::user_id(42)),
    )
}

fn build_app<S>(store: Arc<S>) -> Router
where
    S: UserStore + ContentStore + ReferralStore + LeaderboardStore + MembershipStore + 'static,
{
    quizgate_api::build_router(build_state(store))
}

/// Build the full app router over an in-memory store.
pub fn build_test_app(store: Arc<InMemoryStore>) -> Router {
    build_app(store)
}

/// Build the full app router over an in-memory store, admitting only
/// users whose channel membership was reported to the store.
pub fn build_gated_app(store: Arc<InMemoryStore>) -> Router {
    quizgate_api::build_router(build_state(store.clone()).with_membership_gate(store))
}

/// Build the full app router over a real `PgStore`.
pub fn build_pg_app(pool: PgPool) -> Router {
    build_app(Arc::new(PgStore::new(pool)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send an admin request with a raw body and return the response.
pub async fn admin_request(
    app: &Router,
    method: &str,
    uri: &str,
    body: String,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-admin-id", ADMIN_ID)
        .body(Body::from(body))
        .unwrap();

    send(app, request).await
}

/// A JSON question bank of `count` questions, every answer keyed `a`.
pub fn question_bank(count: u32) -> String {
    let questions: Vec<serde_json::Value> = (1..=count)
        .map(|n| {
            serde_json::json!({
                "question_number": n,
                "question_text": format!("Question {n}?"),
                "options": { "a": "right", "b": "wrong", "c": "wrong", "d": "wrong" },
                "answer": "a",
                "explanation": format!("Option a is right for {n}."),
            })
        })
        .collect();
    serde_json::to_string(&questions).unwrap()
}
