//! Shared setup for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;
use shufflr::api::AppState;
use shufflr::config::Config;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub upload_dir: PathBuf,
}

pub async fn spawn_app() -> TestApp {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("shufflr-test-{id}.db"));
    let upload_dir = std::env::temp_dir().join(format!("shufflr-test-uploads-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.general.upload_dir = upload_dir.display().to_string();
    config.security.session_secret = Some("integration-test-secret".to_string());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = shufflr::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    TestApp {
        router: shufflr::api::router(state.clone()),
        state,
        upload_dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_with_key(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .header("X-API-Key", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .header("cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Writes a file into the upload dir and records it.
    pub async fn add_image(&self, filename: &str, enabled: bool) -> shufflr::db::ImageFile {
        tokio::fs::create_dir_all(&self.upload_dir).await.unwrap();
        let bytes = format!("fake image bytes for {filename}");
        tokio::fs::write(self.upload_dir.join(filename), &bytes)
            .await
            .unwrap();

        let store = self.state.store();
        let image = store
            .add_image(filename, bytes.len() as i64, "image/png")
            .await
            .unwrap();
        if !enabled {
            store.set_image_enabled(image.id, false).await.unwrap();
        }
        image
    }

    pub async fn create_key(&self, name: &str) -> (i32, String) {
        let issued = self.state.auth().create_api_key(name).await.unwrap();
        (issued.key.id, issued.token)
    }

    pub async fn set_setting(&self, key: &str, value: &str) {
        self.state
            .store()
            .save_settings(&[(key, value.to_string())])
            .await
            .unwrap();
    }

    /// Creates the admin through the setup form, logs in and returns the
    /// `name=value` session cookie.
    pub async fn login_admin(&self) -> String {
        let response = self
            .post_form(
                "/admin/setup",
                "username=admin&password=secret123&confirm_password=secret123",
                None,
            )
            .await;
        assert_eq!(response.status(), 303);

        let response = self
            .post_form("/admin/login", "username=admin&password=secret123", None)
            .await;
        assert_eq!(response.status(), 303);
        assert_eq!(response.headers()["location"], "/admin");

        session_cookie(&response).expect("login did not set a session cookie")
    }
}

/// `name=value` part of the session `Set-Cookie` header, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("shufflr-session="))
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
