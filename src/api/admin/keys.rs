use axum::{
    Extension, Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::views::{self, Flash};
use crate::api::AppState;
use crate::api::validation::{parse_enabled_flag, validate_id};
use crate::services::{AdminIdentity, AuthError};

const KEYS_PAGE: &str = "/admin/api-keys";

#[derive(Debug, Default, Deserialize)]
pub struct NewKeyForm {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyIdForm {
    #[serde(default)]
    pub key_id: String,
    #[serde(default)]
    pub enabled: String,
}

impl KeyIdForm {
    fn id(&self) -> Option<i32> {
        self.key_id
            .trim()
            .parse()
            .ok()
            .and_then(|id| validate_id(id, "key").ok())
    }
}

/// GET /admin/api-keys
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AdminIdentity>,
    Query(mut flash): Query<Flash>,
) -> Html<String> {
    let keys = state.auth().list_api_keys().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to list API keys");
        flash.error.get_or_insert_with(|| "Failed to load API keys".to_string());
        Vec::new()
    });

    views::api_keys_page(&user, &flash, &keys)
}

/// GET /admin/api-keys/new
pub async fn new_form(Extension(user): Extension<AdminIdentity>) -> Html<String> {
    views::new_api_key_page(&user, &Flash::default(), "")
}

/// POST /admin/api-keys/new
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AdminIdentity>,
    Form(form): Form<NewKeyForm>,
) -> Html<String> {
    match state.auth().create_api_key(&form.name).await {
        Ok(issued) => views::issued_api_key_page(
            &user,
            &issued.key.name,
            &issued.token,
            &state.config().general.base_url,
        ),
        Err(AuthError::Validation(msg)) => {
            views::new_api_key_page(&user, &Flash::error(msg), form.name.trim())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create API key");
            views::new_api_key_page(
                &user,
                &Flash::error("Failed to create API key"),
                form.name.trim(),
            )
        }
    }
}

/// POST /admin/api-keys/toggle
pub async fn toggle(State(state): State<Arc<AppState>>, Form(form): Form<KeyIdForm>) -> Redirect {
    let Some(id) = form.id() else {
        return views::redirect_error(KEYS_PAGE, "Invalid key ID");
    };
    let enabled = parse_enabled_flag(&form.enabled);

    match state.auth().set_api_key_enabled(id, enabled).await {
        Ok(()) => {
            let action = if enabled { "enabled" } else { "disabled" };
            views::redirect_success(KEYS_PAGE, &format!("API key {action} successfully"))
        }
        Err(AuthError::KeyNotFound) => views::redirect_error(KEYS_PAGE, "API key not found"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update API key");
            views::redirect_error(KEYS_PAGE, "Failed to update API key")
        }
    }
}

/// POST /admin/api-keys/delete
pub async fn delete(State(state): State<Arc<AppState>>, Form(form): Form<KeyIdForm>) -> Redirect {
    let Some(id) = form.id() else {
        return views::redirect_error(KEYS_PAGE, "Invalid key ID");
    };

    match state.auth().delete_api_key(id).await {
        Ok(()) => views::redirect_success(KEYS_PAGE, "API key deleted successfully"),
        Err(AuthError::KeyNotFound) => views::redirect_error(KEYS_PAGE, "API key not found"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete API key");
            views::redirect_error(KEYS_PAGE, "Failed to delete API key")
        }
    }
}

/// POST /admin/api-keys/regenerate
///
/// The old token stops working immediately. The new one is shown once.
pub async fn regenerate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AdminIdentity>,
    Form(form): Form<KeyIdForm>,
) -> Response {
    let Some(id) = form.id() else {
        return views::redirect_error(KEYS_PAGE, "Invalid key ID").into_response();
    };

    match state.auth().regenerate_api_key(id).await {
        Ok(issued) => views::issued_api_key_page(
            &user,
            &issued.key.name,
            &issued.token,
            &state.config().general.base_url,
        )
        .into_response(),
        Err(AuthError::KeyNotFound) => {
            views::redirect_error(KEYS_PAGE, "API key not found").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to regenerate API key");
            views::redirect_error(KEYS_PAGE, "Failed to regenerate API key").into_response()
        }
    }
}
