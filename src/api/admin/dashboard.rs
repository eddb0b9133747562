use axum::{
    Extension,
    extract::{Query, State},
    response::Html,
};
use std::sync::Arc;

use super::views::{self, DashboardStats, Flash};
use crate::api::AppState;
use crate::services::AdminIdentity;

/// GET /admin
///
/// Counts that fail to load are shown as zero.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AdminIdentity>,
    Query(flash): Query<Flash>,
) -> Html<String> {
    let store = state.store();

    let or_zero = |what: &str, result: anyhow::Result<u64>| {
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load {what} for dashboard");
            0
        })
    };

    let enabled_images = or_zero("enabled image count", store.count_enabled_images().await);
    let total_images = or_zero("image count", store.count_images().await);
    let requests = or_zero("request count", store.total_api_requests().await);

    let keys = store.list_api_keys().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load API keys for dashboard");
        Vec::new()
    });

    let stats = DashboardStats {
        enabled_images,
        total_images,
        api_keys: keys.len(),
        active_api_keys: keys.iter().filter(|k| k.enabled).count(),
        requests,
    };

    views::dashboard_page(&user, &flash, &stats, &state.config().general.base_url)
}
