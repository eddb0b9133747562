//! Browser admin interface under `/admin`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;

use super::{AppState, auth as guard, observability};

mod auth;
mod dashboard;
mod images;
mod keys;
mod settings;
pub mod views;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let max_upload_bytes = state.config().server.max_upload_bytes;

    let protected = Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/images", get(images::list))
        .route(
            "/images/upload",
            get(images::upload_form)
                .post(images::upload)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/images/rename", post(images::rename))
        .route("/images/delete", post(images::delete))
        .route("/images/toggle", post(images::toggle))
        .route("/images/serve/{filename}", get(images::preview))
        .route("/api-keys", get(keys::list))
        .route("/api-keys/new", get(keys::new_form).post(keys::create))
        .route("/api-keys/toggle", post(keys::toggle))
        .route("/api-keys/delete", post(keys::delete))
        .route("/api-keys/regenerate", post(keys::regenerate))
        .route("/settings", get(settings::show).post(settings::save))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_admin,
        ))
        .route_layer(middleware::from_fn_with_state(state, guard::setup_gate));

    Router::new()
        .route("/setup", get(auth::setup_form).post(auth::setup_submit))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/logout", get(auth::logout).post(auth::logout))
        .merge(protected)
}
