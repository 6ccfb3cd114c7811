//! Integration tests for the vote option image backfill endpoint.

mod helpers;

use axum::http::StatusCode;
use helpers::{
    setup_test_app, setup_test_app_with, InMemoryVoteOptionStore, TestOptions, BACKFILL_TOKEN,
    STORAGE_BASE_URL,
};
use serde_json::Value;
use uuid::Uuid;
use waypoint_core::models::VoteOptionImages;

const TRIP: &str = "trip-42";

fn row(image_url: Option<&str>, photos: Option<&[&str]>) -> VoteOptionImages {
    VoteOptionImages {
        id: Uuid::new_v4(),
        image_url: image_url.map(String::from),
        photo_urls: photos.map(|p| p.iter().map(|s| s.to_string()).collect()),
    }
}

/// Five rows: two empty, one already stable, two external.
fn mixed_rows() -> Vec<VoteOptionImages> {
    let stable = format!("{}/cached/external/seen.png", STORAGE_BASE_URL);
    vec![
        row(None, None),
        row(Some("   "), Some(&[][..])),
        row(Some(stable.as_str()), None),
        row(Some("https://hotel.example.com/room.png"), None),
        row(Some("https://beach.example.com/sunset.png"), None),
    ]
}

#[tokio::test]
async fn test_backfill_page_report() {
    let rows = mixed_rows();
    let external_id = rows[3].id;
    let app = setup_test_app_with(TestOptions {
        store: InMemoryVoteOptionStore::with_rows(TRIP, rows),
        ..Default::default()
    })
    .await;

    let response = app
        .client()
        .get("/api/backfill-vote-images")
        .add_header("x-backfill-token", BACKFILL_TOKEN)
        .add_query_param("tripId", TRIP)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "no-store"
    );
    let body: Value = response.json();
    assert_eq!(body["processed"], 5);
    assert_eq!(body["skippedEmpty"], 2);
    assert_eq!(body["skippedStable"], 1);
    assert_eq!(body["cachedCount"], 2);
    assert_eq!(body["updated"], 2);
    assert!(body["nextOffset"].is_null());
    assert_eq!(body["errors"].as_array().unwrap().len(), 0);

    let updated = app.store.row(external_id).unwrap();
    let image_url = updated.image_url.unwrap();
    assert!(image_url.starts_with(&format!("{}/cached/external/", STORAGE_BASE_URL)));
    assert_eq!(app.store.update_calls(), 2);
}

#[tokio::test]
async fn test_backfill_is_idempotent() {
    let app = setup_test_app_with(TestOptions {
        store: InMemoryVoteOptionStore::with_rows(TRIP, mixed_rows()),
        ..Default::default()
    })
    .await;

    let first = app
        .client()
        .get("/api/backfill-vote-images")
        .add_header("x-backfill-token", BACKFILL_TOKEN)
        .add_query_param("tripId", TRIP)
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let fetches_after_first = app.fetcher.calls();

    let second = app
        .client()
        .get("/api/backfill-vote-images")
        .add_header("x-backfill-token", BACKFILL_TOKEN)
        .add_query_param("tripId", TRIP)
        .await;
    let body: Value = second.json();
    assert_eq!(body["cachedCount"], 0);
    assert_eq!(body["skippedStable"], 3);
    assert_eq!(body["updated"], 0);
    assert_eq!(app.fetcher.calls(), fetches_after_first);
}

#[tokio::test]
async fn test_backfill_dry_run_writes_nothing() {
    let app = setup_test_app_with(TestOptions {
        store: InMemoryVoteOptionStore::with_rows(TRIP, mixed_rows()),
        ..Default::default()
    })
    .await;

    let response = app
        .client()
        .get("/api/backfill-vote-images")
        .add_query_param("token", BACKFILL_TOKEN)
        .add_query_param("tripId", TRIP)
        .add_query_param("dryRun", "1")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["cachedCount"], 2);
    assert_eq!(body["updated"], 0);
    assert_eq!(app.store.update_calls(), 0);
    assert!(!app.storage_path().join("cached").exists());
}

#[tokio::test]
async fn test_backfill_paging() {
    let rows: Vec<_> = (0..5).map(|_| row(None, None)).collect();
    let app = setup_test_app_with(TestOptions {
        store: InMemoryVoteOptionStore::with_rows(TRIP, rows),
        ..Default::default()
    })
    .await;

    let response = app
        .client()
        .get("/api/backfill-vote-images")
        .add_header("authorization", format!("Bearer {}", BACKFILL_TOKEN))
        .add_query_param("tripId", TRIP)
        .add_query_param("limit", "2")
        .add_query_param("offset", "2")
        .await;

    let body: Value = response.json();
    assert_eq!(body["processed"], 2);
    assert_eq!(body["nextOffset"], 4);
}

#[tokio::test]
async fn test_backfill_rejects_missing_or_wrong_token() {
    let app = setup_test_app_with(TestOptions {
        store: InMemoryVoteOptionStore::with_rows(TRIP, mixed_rows()),
        ..Default::default()
    })
    .await;

    let response = app
        .client()
        .get("/api/backfill-vote-images")
        .add_query_param("tripId", TRIP)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .client()
        .get("/api/backfill-vote-images")
        .add_header("x-backfill-token", "guess")
        .add_query_param("tripId", TRIP)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    assert_eq!(app.store.list_calls(), 0);
    assert_eq!(app.fetcher.calls(), 0);
}

#[tokio::test]
async fn test_backfill_requires_trip_id() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/backfill-vote-images")
        .add_header("x-backfill-token", BACKFILL_TOKEN)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.list_calls(), 0);
}

#[tokio::test]
async fn test_backfill_missing_server_config() {
    let app = setup_test_app_with(TestOptions {
        backfill_token: None,
        ..Default::default()
    })
    .await;
    let response = app
        .client()
        .get("/api/backfill-vote-images")
        .add_header("x-backfill-token", BACKFILL_TOKEN)
        .add_query_param("tripId", TRIP)
        .await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let app = setup_test_app_with(TestOptions {
        with_database: false,
        ..Default::default()
    })
    .await;
    let response = app
        .client()
        .get("/api/backfill-vote-images")
        .add_header("x-backfill-token", BACKFILL_TOKEN)
        .add_query_param("tripId", TRIP)
        .await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}
