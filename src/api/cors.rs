use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::AppState;
use crate::services::RuntimeSettings;

/// CORS for `/api`, driven by the settings table on every request.
///
/// The loaded settings snapshot is handed to inner layers through the request
/// extensions. `OPTIONS` is answered here and never reaches a guard.
pub async fn cors_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let settings = state.settings().load_or_default().await;

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        if settings.cors_enabled {
            apply_preflight_headers(response.headers_mut(), &settings);
        }
        return response;
    }

    request.extensions_mut().insert(settings.clone());
    let mut response = next.run(request).await;

    if settings.cors_enabled {
        apply_cors_headers(response.headers_mut(), &settings);
    }

    response
}

fn allow_origin(settings: &RuntimeSettings) -> HeaderValue {
    HeaderValue::from_str(&settings.cors_origins).unwrap_or_else(|_| HeaderValue::from_static("*"))
}

fn apply_cors_headers(headers: &mut HeaderMap, settings: &RuntimeSettings) {
    headers.insert("access-control-allow-origin", allow_origin(settings));
    headers.insert("access-control-allow-methods", HeaderValue::from_static("GET"));
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("X-API-Key, Authorization"),
    );
}

fn apply_preflight_headers(headers: &mut HeaderMap, settings: &RuntimeSettings) {
    headers.insert("access-control-allow-origin", allow_origin(settings));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("X-API-Key, Authorization, Content-Type"),
    );
    headers.insert("access-control-max-age", HeaderValue::from_static("86400"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_origin_falls_back_to_wildcard() {
        let settings = RuntimeSettings {
            cors_origins: "bad\norigin".to_string(),
            ..RuntimeSettings::default()
        };
        assert_eq!(allow_origin(&settings), "*");
    }

    #[test]
    fn test_preflight_headers() {
        let settings = RuntimeSettings {
            cors_origins: "https://app.example".to_string(),
            ..RuntimeSettings::default()
        };
        let mut headers = HeaderMap::new();
        apply_preflight_headers(&mut headers, &settings);

        assert_eq!(headers["access-control-allow-origin"], "https://app.example");
        assert_eq!(headers["access-control-max-age"], "86400");
        assert!(
            headers["access-control-allow-headers"]
                .to_str()
                .unwrap()
                .contains("Content-Type")
        );
    }
}
