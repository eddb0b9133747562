//! Request logging, HTTP metrics, security headers and the Prometheus endpoint.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::api::AppState;

/// GET /admin/metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.prometheus_handle.as_ref() {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics are disabled").into_response(),
    }
}

/// Coarse route family used as the `path` metrics label.
///
/// Runs outside the router, so the matched route is not known yet. Image
/// filenames and asset paths are folded into their family.
fn route_family(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/api/images" => "/api/images",
        p if p.starts_with("/api/images/") => "/api/images/{filename}",
        p if p.starts_with("/admin/images/serve/") => "/admin/images/serve/{filename}",
        p if p.starts_with("/admin") => "/admin",
        p if p.starts_with("/static/") => "/static",
        _ => "other",
    }
}

fn outcome(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "success"
    }
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    if req.uri().path() == "/health" {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let family = route_family(&path);

    // Filled in by the guards once a key or admin session is resolved.
    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %path,
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;
        let status = response.status();
        let elapsed = start.elapsed();

        let labels = [
            ("method", method),
            ("path", family.to_string()),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status.is_server_error() {
            warn!(status_code = status.as_u16(), duration_ms, outcome = outcome(status), "Request failed");
        } else {
            info!(status_code = status.as_u16(), duration_ms, outcome = outcome(status), "Request finished");
        }

        response
    }
    .instrument(span)
    .await
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let is_admin = req.uri().path().starts_with("/admin");
    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut(), is_admin);
    response
}

fn apply_security_headers(headers: &mut HeaderMap, is_admin: bool) {
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Public images are embedded by third-party pages; only the admin UI is locked down.
    if is_admin {
        headers.insert(
            "content-security-policy",
            HeaderValue::from_static(
                "default-src 'self'; img-src 'self' data:; style-src 'self'; form-action 'self'; frame-ancestors 'none'; base-uri 'self'",
            ),
        );
        headers.insert("cache-control", HeaderValue::from_static("no-store"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_family_folds_filenames() {
        assert_eq!(route_family("/api/images"), "/api/images");
        assert_eq!(route_family("/api/images/cat.png"), "/api/images/{filename}");
        assert_eq!(
            route_family("/admin/images/serve/cat.png"),
            "/admin/images/serve/{filename}"
        );
        assert_eq!(route_family("/admin/api-keys/new"), "/admin");
        assert_eq!(route_family("/static/style.css"), "/static");
        assert_eq!(route_family("/wp-login.php"), "other");
    }

    #[test]
    fn test_outcome_classes() {
        assert_eq!(outcome(StatusCode::OK), "success");
        assert_eq!(outcome(StatusCode::SEE_OTHER), "success");
        assert_eq!(outcome(StatusCode::UNAUTHORIZED), "client_error");
        assert_eq!(outcome(StatusCode::SERVICE_UNAVAILABLE), "error");
    }

    #[test]
    fn test_csp_only_on_admin() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, false);
        assert!(!headers.contains_key("content-security-policy"));
        assert_eq!(headers["x-content-type-options"], "nosniff");

        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, true);
        assert!(headers.contains_key("content-security-policy"));
        assert_eq!(headers["cache-control"], "no-store");
    }
}
