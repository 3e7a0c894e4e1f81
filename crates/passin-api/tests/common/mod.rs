//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use passin_attendee_store::pg_attendee_store::PgAttendeeStore;
use passin_core::clock::Clock;
use passin_registration::application::policy::{AdmissionPolicy, RetryPolicy};
use passin_test_support::FixedClock;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use passin_api::state::AppState;

/// Build the full app router with a real `PgAttendeeStore` and a fixed clock.
pub fn build_test_app(pool: PgPool) -> Router {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock::default());
    let attendee_store = Arc::new(PgAttendeeStore::new(pool));
    let policy = AdmissionPolicy {
        retry: RetryPolicy::new().with_initial_delay(Duration::from_millis(1)),
        timeout: Some(Duration::from_secs(10)),
    };

    passin_api::app(AppState::new(clock, attendee_store, policy))
}

/// Insert an event row and return its id.
pub async fn seed_event(pool: &PgPool, maximum_attendees: Option<i32>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO events (id, title, slug, maximum_attendees) VALUES ($1, $2, $3, $4)",
    )
    .bind(id.to_string())
    .bind("Unite Summit")
    .bind(format!("unite-summit-{id}"))
    .bind(maximum_attendees)
    .execute(pool)
    .await
    .unwrap();
    id
}

/// Number of attendee rows for an event.
pub async fn attendee_count(pool: &PgPool, event_id: Uuid) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendees WHERE event_id = $1")
        .bind(event_id.to_string())
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
