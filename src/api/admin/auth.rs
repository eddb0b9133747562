use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::Cookies;

use super::views::{self, Flash};
use crate::api::AppState;
use crate::services::AuthError;

#[derive(Debug, Default, Deserialize)]
pub struct SetupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// GET /admin/setup
pub async fn setup_form(State(state): State<Arc<AppState>>) -> Response {
    match state.auth().has_admin().await {
        Ok(true) => Redirect::to("/admin/login").into_response(),
        Ok(false) => views::setup_page(&Flash::default(), "").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to check for admin accounts");
            views::setup_page(&Flash::error("Internal server error"), "").into_response()
        }
    }
}

/// POST /admin/setup
pub async fn setup_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SetupForm>,
) -> Response {
    if matches!(state.auth().has_admin().await, Ok(true)) {
        return Redirect::to("/admin/login").into_response();
    }

    let username = form.username.trim();

    let error = if username.is_empty() || form.password.is_empty() {
        "Username and password are required".to_string()
    } else if form.password != form.confirm_password {
        "Passwords do not match".to_string()
    } else {
        match state.auth().create_first_admin(username, &form.password).await {
            Ok(_) => {
                return views::redirect_success("/admin/login", "Admin account created successfully")
                    .into_response();
            }
            Err(AuthError::AlreadyInitialized) => {
                return Redirect::to("/admin/login").into_response();
            }
            Err(AuthError::Validation(msg)) => msg,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create admin user");
                "Failed to create admin user".to_string()
            }
        }
    };

    views::setup_page(&Flash::error(error), username).into_response()
}

/// GET /admin/login
pub async fn login_form(Query(flash): Query<Flash>) -> Response {
    views::login_page(&flash, "").into_response()
}

/// POST /admin/login
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();

    let error = if username.is_empty() || form.password.is_empty() {
        "Username and password are required"
    } else {
        match state.auth().verify_admin_password(username, &form.password).await {
            Ok(Some(user)) => {
                state.sessions().issue(&cookies, &user);
                tracing::info!(username = %user.username, "Admin logged in");
                return Redirect::to("/admin").into_response();
            }
            Ok(None) => {
                tracing::warn!(username = %username, "Failed admin login");
                "Invalid username or password"
            }
            Err(e) => {
                tracing::error!(error = %e, "Error during login");
                "Login failed"
            }
        }
    };

    views::login_page(&Flash::error(error), username).into_response()
}

/// GET|POST /admin/logout
pub async fn logout(State(state): State<Arc<AppState>>, cookies: Cookies) -> Redirect {
    state.sessions().invalidate(&cookies);
    Redirect::to("/admin/login")
}
