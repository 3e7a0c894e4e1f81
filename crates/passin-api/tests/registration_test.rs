//! Integration tests for attendee registration against PostgreSQL.

mod common;

use axum::http::StatusCode;
use sqlx::PgPool;
use tokio::task::JoinSet;
use uuid::Uuid;

fn registration(name: &str, email: &str) -> serde_json::Value {
    serde_json::json!({ "name": name, "email": email })
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_register_round_trip(pool: PgPool) {
    let event_id = common::seed_event(&pool, Some(50)).await;
    let app = common::build_test_app(pool.clone());

    // POST /events/{event_id}/attendees
    let (status, json) = common::post_json(
        app,
        &format!("/events/{event_id}/attendees"),
        &registration("Alice Doe", "alice@x.com"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let attendee_id = json["attendeeId"].as_i64().unwrap();

    // Verify the persisted row
    let row: (String, String, String) =
        sqlx::query_as("SELECT name, email, event_id FROM attendees WHERE id = $1")
            .bind(attendee_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(row.0, "Alice Doe");
    assert_eq!(row.1, "alice@x.com");
    assert_eq!(row.2, event_id.to_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_register_duplicate_returns_409(pool: PgPool) {
    let event_id = common::seed_event(&pool, None).await;
    let uri = format!("/events/{event_id}/attendees");

    let app = common::build_test_app(pool.clone());
    let (status, _) =
        common::post_json(app, &uri, &registration("Dupe Person", "dup@x.com")).await;
    assert_eq!(status, StatusCode::CREATED);

    let app = common::build_test_app(pool.clone());
    let (status, json) =
        common::post_json(app, &uri, &registration("Dupe Person", "dup@x.com")).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "duplicate_registration");
    assert_eq!(common::attendee_count(&pool, event_id).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_register_for_full_event_returns_409(pool: PgPool) {
    let event_id = common::seed_event(&pool, Some(1)).await;
    let uri = format!("/events/{event_id}/attendees");

    let app = common::build_test_app(pool.clone());
    common::post_json(app, &uri, &registration("Bob Stone", "bob@x.com")).await;

    let app = common::build_test_app(pool.clone());
    let (status, json) =
        common::post_json(app, &uri, &registration("Carol Ray", "carol@x.com")).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "capacity_exceeded");
    assert_eq!(common::attendee_count(&pool, event_id).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_register_for_missing_event_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let event_id = Uuid::new_v4();

    let (status, json) = common::post_json(
        app,
        &format!("/events/{event_id}/attendees"),
        &registration("Alice Doe", "a@x.com"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "unknown_event");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_requests_respect_capacity(pool: PgPool) {
    let event_id = common::seed_event(&pool, Some(2)).await;
    let app = common::build_test_app(pool.clone());
    let uri = format!("/events/{event_id}/attendees");

    let mut requests = JoinSet::new();
    for i in 0..10 {
        let app = app.clone();
        let uri = uri.clone();
        requests.spawn(async move {
            common::post_json(app, &uri, &registration("Racer Name", &format!("r{i}@x.com")))
                .await
        });
    }

    let mut created = 0;
    let mut full = 0;
    while let Some(joined) = requests.join_next().await {
        let (status, json) = joined.unwrap();
        match status {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => {
                assert_eq!(json["error"], "capacity_exceeded");
                full += 1;
            }
            other => panic!("unexpected status {other}: {json}"),
        }
    }

    assert_eq!(created, 2);
    assert_eq!(full, 8);
    assert_eq!(common::attendee_count(&pool, event_id).await, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_duplicate_requests_admit_once(pool: PgPool) {
    let event_id = common::seed_event(&pool, None).await;
    let app = common::build_test_app(pool.clone());
    let uri = format!("/events/{event_id}/attendees");

    let mut requests = JoinSet::new();
    for _ in 0..2 {
        let app = app.clone();
        let uri = uri.clone();
        requests.spawn(async move {
            common::post_json(app, &uri, &registration("Dupe Person", "dup@x.com")).await
        });
    }

    let mut statuses = Vec::new();
    while let Some(joined) = requests.join_next().await {
        statuses.push(joined.unwrap().0);
    }
    statuses.sort();

    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(common::attendee_count(&pool, event_id).await, 1);
}
