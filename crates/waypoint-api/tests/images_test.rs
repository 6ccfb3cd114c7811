//! Integration tests for the single-URL endpoints and operational routes.

mod helpers;

use axum::http::StatusCode;
use helpers::{fetcher::PNG_BYTES, setup_test_app, setup_test_app_with, TestOptions, STORAGE_BASE_URL};
use serde_json::Value;

fn cache_control(response: &axum_test::TestResponse) -> String {
    response
        .headers()
        .get("cache-control")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_cache_image_rehosts_and_serves_object() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/cache-image")
        .add_query_param("url", "https://photos.example.com/lisbon.png")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(cache_control(&response).contains("s-maxage=604800"));
    let body: Value = response.json();
    let public_url = body["publicUrl"].as_str().expect("publicUrl present");
    let prefix = format!("{}/cached/external/", STORAGE_BASE_URL);
    assert!(public_url.starts_with(&prefix), "unexpected url {public_url}");
    assert!(public_url.ends_with(".png"));
    assert!(body.get("error").is_none());

    // The local backend serves what was just stored
    let key = public_url.trim_start_matches(&format!("{}/", STORAGE_BASE_URL));
    let stored = app.client().get(&format!("/storage/{}", key)).await;
    assert_eq!(stored.status_code(), StatusCode::OK);
    assert_eq!(stored.as_bytes().as_ref(), PNG_BYTES);
    assert!(cache_control(&stored).contains("immutable"));
}

#[tokio::test]
async fn test_cache_image_stable_url_is_returned_unchanged() {
    let app = setup_test_app().await;
    let stable = "https://cdn.other.example/cached/external/0b6f.jpg";

    let response = app
        .client()
        .get("/api/cache-image")
        .add_query_param("url", stable)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["publicUrl"], stable);
    assert_eq!(app.fetcher.calls(), 0);
}

#[tokio::test]
async fn test_cache_image_missing_url_is_bad_request() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/cache-image").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .client()
        .get("/api/cache-image")
        .add_query_param("url", "not a url")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(cache_control(&response), "no-store");
}

#[tokio::test]
async fn test_cache_image_blocked_host_reports_error() {
    let app = setup_test_app().await;

    for target in [
        "http://localhost/a.png",
        "http://127.0.0.1/a.png",
        "http://169.254.169.254/latest/meta-data",
        "http://[::1]/a.png",
    ] {
        let response = app
            .client()
            .get("/api/cache-image")
            .add_query_param("url", target)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK, "{target}");
        let body: Value = response.json();
        assert!(body["error"].is_string(), "{target}");
        assert!(body.get("publicUrl").is_none());
        assert_eq!(cache_control(&response), "no-store");
    }
    assert_eq!(app.fetcher.calls(), 0);
}

#[tokio::test]
async fn test_cache_image_upstream_failure_reports_error() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/cache-image")
        .add_query_param("url", "https://photos.example.com/broken.png")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_cache_image_without_storage_is_server_error() {
    let app = setup_test_app_with(TestOptions {
        with_storage: false,
        ..Default::default()
    })
    .await;

    let response = app
        .client()
        .get("/api/cache-image")
        .add_query_param("url", "https://photos.example.com/a.png")
        .await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_image_proxy_passes_bytes_through() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/image-proxy")
        .add_query_param("url", "https://photos.example.com/a.png")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/png"
    );
    assert!(cache_control(&response).contains("s-maxage=31536000"));
    assert_eq!(response.as_bytes().as_ref(), PNG_BYTES);
}

#[tokio::test]
async fn test_image_proxy_status_mapping() {
    let app = setup_test_app().await;

    let cases = [
        ("http://10.0.0.5/a.png", StatusCode::BAD_REQUEST),
        ("ftp://photos.example.com/a.png", StatusCode::BAD_REQUEST),
        ("https://photos.example.com/broken.png", StatusCode::NOT_FOUND),
        ("https://photos.example.com/page", StatusCode::UNSUPPORTED_MEDIA_TYPE),
        ("https://photos.example.com/huge.png", StatusCode::PAYLOAD_TOO_LARGE),
    ];

    for (target, expected) in cases {
        let response = app
            .client()
            .get("/api/image-proxy")
            .add_query_param("url", target)
            .await;
        assert_eq!(response.status_code(), expected, "{target}");
        assert_eq!(cache_control(&response), "no-store", "{target}");
    }
}

#[tokio::test]
async fn test_link_preview_from_json_ld() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/link-preview")
        .add_query_param("url", "https://notes.example.com/article/sintra")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["url"], "https://notes.example.com/article/sintra");
    assert_eq!(body["title"], "Sintra day trip");
    assert_eq!(body["description"], "Palaces and fog");
    assert_eq!(body["image"], "https://notes.example.com/media/sintra.jpg");
    assert_eq!(body["siteName"], "Trip Notes");
}

#[tokio::test]
async fn test_link_preview_failures() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/link-preview")
        .add_query_param("url", "http://192.168.1.1/admin")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["url"], "http://192.168.1.1/admin");
    assert!(body["error"].is_string());

    let response = app
        .client()
        .get("/api/link-preview")
        .add_query_param("url", "https://notes.example.com/missing")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.json::<Value>()["error"].is_string());

    let response = app.client().get("/api/link-preview").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_docs() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "healthy");
    assert_eq!(body["database"], "healthy");

    let response = app.client().get("/live").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let spec: Value = response.json();
    assert!(spec["paths"]["/api/backfill-vote-images"].is_object());
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/live")
        .add_header("x-request-id", "trace-abc")
        .await;

    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-abc");
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}
