use axum::{
    Router, middleware,
    response::Redirect,
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, ImageService, SessionManager, SettingsService};
use crate::state::SharedState;

pub mod admin;
mod assets;
pub mod auth;
mod cors;
mod error;
mod health;
mod images;
mod observability;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn images(&self) -> &Arc<ImageService> {
        &self.shared.image_service
    }

    #[must_use]
    pub fn settings(&self) -> &Arc<SettingsService> {
        &self.shared.settings_service
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.shared.sessions
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let image_routes = Router::new()
        .route("/images", get(images::random_images))
        .route("/images/{filename}", get(images::serve_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_image_access,
        ));

    let api_router = Router::new()
        .merge(image_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cors::cors_middleware,
        ));

    Router::new()
        .route("/", get(|| async { Redirect::to("/admin") }))
        .route("/health", get(health::health))
        .route("/static/{*path}", get(assets::serve_asset))
        .nest("/api", api_router)
        .nest("/admin", admin::router(state.clone()))
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}
