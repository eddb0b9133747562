mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{body_string, session_cookie, spawn_app};
use shufflr::services::RuntimeSettings;

#[tokio::test]
async fn test_root_redirects_to_admin() {
    let app = spawn_app().await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin");
}

#[tokio::test]
async fn test_admin_redirects_to_setup_without_admin() {
    let app = spawn_app().await;

    let response = app.get("/admin").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin/setup");

    let response = app.get("/admin/setup").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("confirm_password"));
}

#[tokio::test]
async fn test_setup_rejects_mismatched_passwords() {
    let app = spawn_app().await;

    let response = app
        .post_form(
            "/admin/setup",
            "username=admin&password=secret123&confirm_password=other123",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Passwords do not match"));
    assert!(!app.state.auth().has_admin().await.unwrap());
}

#[tokio::test]
async fn test_setup_rejects_short_password() {
    let app = spawn_app().await;

    let response = app
        .post_form(
            "/admin/setup",
            "username=admin&password=abc&confirm_password=abc",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!app.state.auth().has_admin().await.unwrap());
}

#[tokio::test]
async fn test_setup_is_closed_after_first_admin() {
    let app = spawn_app().await;
    app.login_admin().await;

    let response = app.get("/admin/setup").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin/login");

    let response = app
        .post_form(
            "/admin/setup",
            "username=intruder&password=secret123&confirm_password=secret123",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let intruder = app
        .state
        .auth()
        .verify_admin_password("intruder", "secret123")
        .await
        .unwrap();
    assert!(intruder.is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = spawn_app().await;
    app.login_admin().await;

    let response = app
        .post_form("/admin/login", "username=admin&password=wrongpass", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());
    assert!(body_string(response).await.contains("Invalid username or password"));
}

#[tokio::test]
async fn test_session_cookie_grants_dashboard() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;

    let response = app.get("/admin").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin/login");

    let response = app.get_with_cookie("/admin", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("admin"));
}

#[tokio::test]
async fn test_forged_cookie_is_rejected() {
    let app = spawn_app().await;
    app.login_admin().await;

    let response = app
        .get_with_cookie("/admin", "shufflr-session=not-encrypted")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin/login");
}

#[tokio::test]
async fn test_logout_removes_cookie() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;

    let response = app.post_form("/admin/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin/login");

    let removal = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("shufflr-session="))
        .expect("logout did not clear the session cookie")
        .to_string();
    assert!(removal.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_create_api_key_shows_token_once() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;

    let response = app
        .post_form("/admin/api-keys/new", "name=Gallery+site", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Gallery site"));

    let keys = app.state.auth().list_api_keys().await.unwrap();
    assert_eq!(keys.len(), 1);

    // The page body is the only place the raw token appears.
    let token = body
        .split("<pre class=\"token\">")
        .nth(1)
        .and_then(|rest| rest.split("</pre>").next())
        .unwrap()
        .to_string();
    assert_eq!(token.len(), 64);
    assert!(app.state.auth().verify_api_key(&token).await.unwrap().is_some());

    let listing = body_string(app.get_with_cookie("/admin/api-keys", &cookie).await).await;
    assert!(listing.contains("Gallery site"));
    assert!(!listing.contains(&token));
}

#[tokio::test]
async fn test_create_api_key_rejects_blank_name() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;

    let response = app
        .post_form("/admin/api-keys/new", "name=+++", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.state.auth().list_api_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_toggle_and_delete_api_key() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;
    let (id, token) = app.create_key("managed").await;

    let response = app
        .post_form(
            "/admin/api-keys/toggle",
            &format!("key_id={id}&enabled=false"),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.state.auth().verify_api_key(&token).await.unwrap().is_none());

    let response = app
        .post_form("/admin/api-keys/delete", &format!("key_id={id}"), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.state.store().get_api_key(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_regenerate_from_admin_shows_new_token() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;
    let (id, old_token) = app.create_key("rotating").await;

    let response = app
        .post_form(
            "/admin/api-keys/regenerate",
            &format!("key_id={id}"),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("rotating"));
    assert!(!body.contains(&old_token));
    assert!(app.state.auth().verify_api_key(&old_token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_settings_form_updates_runtime_settings() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;

    let response = app
        .post_form(
            "/admin/settings",
            "default_image_count=3&max_image_count=10&cors_enabled=on&cors_origins=https%3A%2F%2Fa.example",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let settings = app.state.settings().load().await.unwrap();
    assert_eq!(
        settings,
        RuntimeSettings {
            require_api_key_for_images: false,
            default_image_count: 3,
            max_image_count: 10,
            cors_enabled: true,
            cors_origins: "https://a.example".to_string(),
        }
    );

    // Unticked require box opens the public API.
    app.add_image("a.png", true).await;
    let response = app.get("/api/images").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = app.get("/api/images?count=1").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_settings_form_rejects_default_above_max() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;

    let response = app
        .post_form(
            "/admin/settings",
            "require_api_key_for_images=on&default_image_count=50&max_image_count=10",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("cannot be greater"));

    let settings = app.state.settings().load().await.unwrap();
    assert_eq!(settings, RuntimeSettings::default());
}

#[tokio::test]
async fn test_upload_rename_toggle_delete_image() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;

    let boundary = "shufflr-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"images\"; filename=\"photo.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         png bytes\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"images\"; filename=\"notes.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         not an image\r\n\
         --{boundary}--\r\n"
    );
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/admin/images/upload")
                .header("cookie", &cookie)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    assert!(location.starts_with("/admin/images?error="));
    assert!(location.contains("notes.txt"));

    let image = app
        .state
        .store()
        .get_image_by_filename("photo.png")
        .await
        .unwrap()
        .unwrap();
    assert!(image.enabled);
    assert_eq!(image.size, 9);
    assert!(app.upload_dir.join("photo.png").exists());

    let response = app
        .post_form(
            "/admin/images/rename",
            "old_filename=photo.png&new_filename=sunset.png",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.upload_dir.join("sunset.png").exists());
    assert!(!app.upload_dir.join("photo.png").exists());

    let response = app
        .post_form(
            "/admin/images/toggle",
            "filename=sunset.png&enabled=false",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.state.store().count_enabled_images().await.unwrap(), 0);

    // Admin preview still serves disabled images.
    let response = app
        .get_with_cookie("/admin/images/serve/sunset.png", &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_form("/admin/images/delete", "filename=sunset.png", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.state.store().count_images().await.unwrap(), 0);
    assert!(!app.upload_dir.join("sunset.png").exists());
}

#[tokio::test]
async fn test_upload_keeps_existing_file() {
    let app = spawn_app().await;
    app.add_image("dup.png", true).await;

    let saved = app
        .state
        .images()
        .save_upload("dup.png", Some("image/png"), b"second")
        .await
        .unwrap();

    assert_eq!(saved.filename, "dup_1.png");
    assert_eq!(app.state.store().count_images().await.unwrap(), 2);
}

#[tokio::test]
async fn test_admin_pages_render() {
    let app = spawn_app().await;
    let cookie = app.login_admin().await;

    for page in [
        "/admin/images",
        "/admin/images/upload",
        "/admin/api-keys",
        "/admin/api-keys/new",
        "/admin/settings",
    ] {
        let response = app.get_with_cookie(page, &cookie).await;
        assert_eq!(response.status(), StatusCode::OK, "{page}");
    }
}

#[tokio::test]
async fn test_stylesheet_is_embedded() {
    let app = spawn_app().await;

    let response = app.get("/static/style.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/css")
    );
}
