mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{body_json, spawn_app};
use shufflr::constants::settings as keys;
use std::time::Duration;

#[tokio::test]
async fn test_health_reports_enabled_image_count() {
    let app = spawn_app().await;
    app.add_image("a.png", true).await;
    app.add_image("b.png", true).await;
    app.add_image("c.png", false).await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["image_count"], 2);
}

#[tokio::test]
async fn test_random_images_requires_key_by_default() {
    let app = spawn_app().await;
    app.add_image("a.png", true).await;

    let response = app.get("/api/images").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "API key required");
}

#[tokio::test]
async fn test_unknown_key_is_rejected() {
    let app = spawn_app().await;

    let response = app.get_with_key("/api/images", "not-a-real-key").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid API key");
}

#[tokio::test]
async fn test_random_images_with_valid_key() {
    let app = spawn_app().await;
    for name in ["a.png", "b.png", "c.png"] {
        app.add_image(name, true).await;
    }
    app.add_image("hidden.png", false).await;
    let (_, token) = app.create_key("frontend").await;

    let response = app.get_with_key("/api/images?count=3", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 3);

    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 3);
    for image in images {
        let filename = image["filename"].as_str().unwrap();
        assert_ne!(filename, "hidden.png");
        assert_eq!(image["url"], format!("/api/images/{filename}"));
    }
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let app = spawn_app().await;
    app.add_image("a.png", true).await;
    let (_, token) = app.create_key("bearer").await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/images?count=1")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_disabled_key_is_rejected() {
    let app = spawn_app().await;
    app.add_image("a.png", true).await;
    let (id, token) = app.create_key("temporary").await;

    app.state.auth().set_api_key_enabled(id, false).await.unwrap();

    let response = app.get_with_key("/api/images?count=1", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_count_defaults_and_limits() {
    let app = spawn_app().await;
    for i in 0..5 {
        app.add_image(&format!("img{i}.png"), true).await;
    }
    app.set_setting(keys::DEFAULT_IMAGE_COUNT, "2").await;
    app.set_setting(keys::MAX_IMAGE_COUNT, "4").await;
    let (_, token) = app.create_key("limits").await;

    let json = body_json(app.get_with_key("/api/images", &token).await).await;
    assert_eq!(json["count"], 2);

    let json = body_json(app.get_with_key("/api/images?count=abc", &token).await).await;
    assert_eq!(json["count"], 2);

    let response = app.get_with_key("/api/images?count=5", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains('4'));

    app.set_setting(keys::MAX_IMAGE_COUNT, "50").await;
    let response = app.get_with_key("/api/images?count=6", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains('5'));

    let json = body_json(app.get_with_key("/api/images?count=5", &token).await).await;
    assert_eq!(json["count"], 5);
}

#[tokio::test]
async fn test_open_access_when_keys_not_required() {
    let app = spawn_app().await;
    app.add_image("a.png", true).await;
    app.set_setting(keys::REQUIRE_API_KEY_FOR_IMAGES, "false").await;

    let response = app.get("/api/images?count=1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/images/a.png").await;
    assert_eq!(response.status(), StatusCode::OK);

    // Open requests are never logged against a key.
    assert_eq!(app.state.store().total_api_requests().await.unwrap(), 0);
}

#[tokio::test]
async fn test_serve_image_headers() {
    let app = spawn_app().await;
    app.add_image("cat.png", true).await;
    let (_, token) = app.create_key("files").await;

    let response = app.get_with_key("/api/images/cat.png", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.headers()["cache-control"], "public, max-age=86400");

    let body = common::body_string(response).await;
    assert_eq!(body, "fake image bytes for cat.png");
}

#[tokio::test]
async fn test_serve_image_requires_key() {
    let app = spawn_app().await;
    app.add_image("cat.png", true).await;

    let response = app.get("/api/images/cat.png").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_disabled_or_missing_image_is_not_found() {
    let app = spawn_app().await;
    app.add_image("off.png", false).await;
    let (_, token) = app.create_key("files").await;

    let response = app.get_with_key("/api/images/off.png", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get_with_key("/api/images/nope.png", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_is_logged_and_last_used_updated() {
    let app = spawn_app().await;
    app.add_image("a.png", true).await;
    let (id, token) = app.create_key("tracked").await;

    let key = app.state.store().get_api_key(id).await.unwrap().unwrap();
    assert!(key.last_used_at.is_none());

    let response = app.get_with_key("/api/images?count=1", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(app.state.store().api_key_usage(id).await.unwrap(), 1);

    // last_used is written in the background.
    let mut touched = false;
    for _ in 0..50 {
        let key = app.state.store().get_api_key(id).await.unwrap().unwrap();
        if key.last_used_at.is_some() {
            touched = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(touched, "last_used_at was never recorded");
}

#[tokio::test]
async fn test_regenerate_invalidates_old_token() {
    let app = spawn_app().await;
    app.add_image("a.png", true).await;
    let (id, old_token) = app.create_key("rotating").await;

    let issued = app.state.auth().regenerate_api_key(id).await.unwrap();
    assert_eq!(issued.key.name, "rotating");
    assert_ne!(issued.token, old_token);

    let response = app.get_with_key("/api/images?count=1", &old_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get_with_key("/api/images?count=1", &issued.token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_headers_follow_settings() {
    let app = spawn_app().await;
    app.add_image("a.png", true).await;
    app.set_setting(keys::CORS_ORIGINS, "https://app.example").await;
    let (_, token) = app.create_key("cors").await;

    let response = app.get_with_key("/api/images?count=1", &token).await;
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://app.example"
    );
    assert_eq!(response.headers()["access-control-allow-methods"], "GET");

    // Rejected requests still carry CORS headers.
    let response = app.get("/api/images").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("access-control-allow-origin"));

    app.set_setting(keys::CORS_ENABLED, "false").await;
    let response = app.get_with_key("/api/images?count=1", &token).await;
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_preflight_skips_api_key_check() {
    let app = spawn_app().await;

    let response = app
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/images")
                .header("Origin", "https://app.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(response.headers()["access-control-max-age"], "86400");
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = spawn_app().await;

    let response = app.get("/health").await;
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-frame-options"));
}

#[tokio::test]
async fn test_listed_url_fetches_filename_with_spaces() {
    let app = spawn_app().await;
    app.add_image("holiday photo.png", true).await;
    let (_, token) = app.create_key("encoding").await;

    let json = body_json(app.get_with_key("/api/images?count=1", &token).await).await;
    let image = &json["images"][0];
    assert_eq!(image["filename"], "holiday photo.png");
    assert_eq!(image["url"], "/api/images/holiday%20photo.png");

    let response = app
        .get_with_key(image["url"].as_str().unwrap(), &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
