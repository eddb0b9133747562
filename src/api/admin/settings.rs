use axum::{
    Extension, Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use super::views::{self, Flash};
use crate::api::AppState;
use crate::services::{AdminIdentity, RuntimeSettings, SettingsError, SettingsForm};

const SETTINGS_PAGE: &str = "/admin/settings";

/// GET /admin/settings
pub async fn show(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AdminIdentity>,
    Query(mut flash): Query<Flash>,
) -> Html<String> {
    let settings = state.settings().load().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load settings");
        flash.error.get_or_insert_with(|| "Failed to load settings".to_string());
        RuntimeSettings::default()
    });

    views::settings_page(&user, &flash, &settings)
}

/// POST /admin/settings
///
/// Invalid input is redisplayed with the submitted values.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AdminIdentity>,
    Form(form): Form<SettingsForm>,
) -> Response {
    let settings = match form.validate() {
        Ok(settings) => settings,
        Err(e) => {
            let shown = submitted_values(&form);
            return views::settings_page(&user, &Flash::error(e.to_string()), &shown).into_response();
        }
    };

    match state.settings().save(&settings).await {
        Ok(()) => {
            tracing::info!(
                require_api_key = settings.require_api_key_for_images,
                default_count = settings.default_image_count,
                max_count = settings.max_image_count,
                cors_enabled = settings.cors_enabled,
                "Settings updated"
            );
            views::redirect_success(SETTINGS_PAGE, "Settings saved successfully").into_response()
        }
        Err(SettingsError::Validation(msg)) => {
            views::settings_page(&user, &Flash::error(msg), &settings).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save settings");
            views::settings_page(&user, &Flash::error("Failed to save some settings"), &settings)
                .into_response()
        }
    }
}

/// Best-effort view of a rejected form so the admin can correct it.
fn submitted_values(form: &SettingsForm) -> RuntimeSettings {
    let defaults = RuntimeSettings::default();
    RuntimeSettings {
        require_api_key_for_images: form.require_api_key_for_images.is_some(),
        default_image_count: form
            .default_image_count
            .trim()
            .parse()
            .unwrap_or(defaults.default_image_count),
        max_image_count: form
            .max_image_count
            .trim()
            .parse()
            .unwrap_or(defaults.max_image_count),
        cors_enabled: form.cors_enabled.is_some(),
        cors_origins: form.cors_origins.clone(),
    }
}
