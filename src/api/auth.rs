use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_cookies::Cookies;

use super::{ApiError, AppState};
use crate::constants::headers::{API_KEY, BEARER_PREFIX};
use crate::db::ApiKey;
use crate::services::RuntimeSettings;

/// Outcome of the public image access policy, attached to the request.
#[derive(Debug, Clone)]
pub enum ImageAccess {
    /// Keys are not required; no usage is recorded.
    Open,
    Keyed(ApiKey),
}

impl ImageAccess {
    #[must_use]
    pub const fn api_key(&self) -> Option<&ApiKey> {
        match self {
            Self::Open => None,
            Self::Keyed(key) => Some(key),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Guards the public image routes.
pub async fn require_image_access(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cached = request.extensions().get::<RuntimeSettings>().cloned();
    let settings = match cached {
        Some(settings) => settings,
        None => state.settings().load_or_default().await,
    };
    let access = authorize_image_access(&state, &settings, request.headers()).await?;

    if let ImageAccess::Keyed(key) = &access {
        tracing::Span::current().record("user_id", format!("api_key:{}", key.id).as_str());
    }

    request.extensions_mut().insert(access);
    request.extensions_mut().insert(settings);
    Ok(next.run(request).await)
}

/// Redirects to the login page unless a valid session cookie is present.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(identity) = state.sessions().resolve(&cookies) else {
        return Redirect::to("/admin/login").into_response();
    };

    tracing::Span::current().record("user_id", identity.username.as_str());
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Sends every admin page to the setup form until the first admin exists.
pub async fn setup_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    match state.auth().has_admin().await {
        Ok(false) => Redirect::to("/admin/setup").into_response(),
        Ok(true) => next.run(request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to check for admin accounts");
            next.run(request).await
        }
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Single access decision for both public image endpoints.
///
/// When keys are not required the request is let through untouched. Otherwise
/// a missing or unknown key is `Unauthorized` and a store failure is an
/// internal error.
pub async fn authorize_image_access(
    state: &AppState,
    settings: &RuntimeSettings,
    headers: &HeaderMap,
) -> Result<ImageAccess, ApiError> {
    if !settings.require_api_key_for_images {
        return Ok(ImageAccess::Open);
    }

    let token = extract_api_key(headers).ok_or_else(|| ApiError::unauthorized("API key required"))?;

    match state.auth().verify_api_key(&token).await {
        Ok(Some(key)) => Ok(ImageAccess::Keyed(key)),
        Ok(None) => Err(ApiError::unauthorized("Invalid API key")),
        Err(e) => Err(ApiError::internal(format!("API key verification failed: {e}"))),
    }
}

/// `X-API-Key` first, then `Authorization: Bearer <token>`.
#[must_use]
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get(API_KEY)
        && let Ok(key_str) = api_key.to_str()
        && !key_str.trim().is_empty()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix(BEARER_PREFIX)
        && !token.trim().is_empty()
    {
        return Some(token.trim().to_string());
    }

    None
}
