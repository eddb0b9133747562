use axum::{
    Extension, Form,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::views::{self, Flash};
use crate::api::validation::{parse_enabled_flag, validate_required};
use crate::api::{ApiError, AppState};
use crate::services::{AdminIdentity, ImageError};

const IMAGES_PAGE: &str = "/admin/images";

#[derive(Debug, Deserialize)]
pub struct RenameForm {
    #[serde(default)]
    pub old_filename: String,
    #[serde(default)]
    pub new_filename: String,
}

#[derive(Debug, Deserialize)]
pub struct FilenameForm {
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub enabled: String,
}

/// GET /admin/images
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AdminIdentity>,
    Query(mut flash): Query<Flash>,
) -> Html<String> {
    let summary = match state.images().summary().await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list images");
            flash.error.get_or_insert_with(|| "Failed to load images".to_string());
            crate::services::CatalogueSummary {
                images: Vec::new(),
                total_size: 0,
                enabled_count: 0,
            }
        }
    };

    views::images_page(&user, &flash, &summary)
}

/// GET /admin/images/upload
pub async fn upload_form(
    Extension(user): Extension<AdminIdentity>,
    Query(flash): Query<Flash>,
) -> Html<String> {
    views::upload_page(&user, &flash)
}

/// POST /admin/images/upload
///
/// Each file in the `images` field is stored independently; failures are
/// collected into the redirect message.
pub async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Redirect {
    let mut uploaded = 0usize;
    let mut errors: Vec<String> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart upload");
                errors.push(format!("upload interrupted: {e}"));
                break;
            }
        };

        if field.name() != Some("images") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        if original_name.is_empty() {
            continue;
        }
        let content_type = field.content_type().map(ToString::to_string);

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                errors.push(format!("{original_name}: {e}"));
                continue;
            }
        };

        match state
            .images()
            .save_upload(&original_name, content_type.as_deref(), &data)
            .await
        {
            Ok(_) => uploaded += 1,
            Err(e) => {
                tracing::warn!(filename = %original_name, error = %e, "Image upload failed");
                errors.push(format!("{original_name}: {e}"));
            }
        }
    }

    if uploaded == 0 && errors.is_empty() {
        return views::redirect_error("/admin/images/upload", "No files selected");
    }

    if errors.is_empty() {
        views::redirect_success(
            IMAGES_PAGE,
            &format!("{uploaded} images uploaded successfully"),
        )
    } else {
        let mut message = format!("Some files failed to upload: {}", errors.join(", "));
        if uploaded > 0 {
            message.push_str(&format!(". {uploaded} files uploaded successfully."));
        }
        views::redirect_error(IMAGES_PAGE, &message)
    }
}

/// POST /admin/images/rename
pub async fn rename(State(state): State<Arc<AppState>>, Form(form): Form<RenameForm>) -> Redirect {
    let (Ok(old), Ok(new)) = (
        validate_required(&form.old_filename, "Filename"),
        validate_required(&form.new_filename, "Filename"),
    ) else {
        return views::redirect_error(IMAGES_PAGE, "Invalid filename");
    };

    match state.images().rename(old, new).await {
        Ok(()) => views::redirect_success(IMAGES_PAGE, "Image renamed successfully"),
        Err(ImageError::NotFound) => views::redirect_error(IMAGES_PAGE, "Original file not found"),
        Err(e @ (ImageError::InvalidFilename | ImageError::AlreadyExists)) => {
            views::redirect_error(IMAGES_PAGE, &e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to rename image");
            views::redirect_error(IMAGES_PAGE, "Failed to rename image")
        }
    }
}

/// POST /admin/images/delete
pub async fn delete(State(state): State<Arc<AppState>>, Form(form): Form<FilenameForm>) -> Redirect {
    let Ok(filename) = validate_required(&form.filename, "Filename") else {
        return views::redirect_error(IMAGES_PAGE, "Invalid filename");
    };

    match state.images().delete(filename).await {
        Ok(()) => views::redirect_success(IMAGES_PAGE, "Image deleted successfully"),
        Err(ImageError::NotFound) => views::redirect_error(IMAGES_PAGE, "Image not found"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete image");
            views::redirect_error(IMAGES_PAGE, "Failed to delete from database")
        }
    }
}

/// POST /admin/images/toggle
pub async fn toggle(State(state): State<Arc<AppState>>, Form(form): Form<ToggleForm>) -> Redirect {
    let Ok(filename) = validate_required(&form.filename, "Filename") else {
        return views::redirect_error(IMAGES_PAGE, "Invalid filename");
    };
    let enabled = parse_enabled_flag(&form.enabled);

    match state.images().set_enabled(filename, enabled).await {
        Ok(()) => {
            let action = if enabled { "enabled" } else { "disabled" };
            views::redirect_success(IMAGES_PAGE, &format!("Image {action} successfully"))
        }
        Err(ImageError::NotFound) => views::redirect_error(IMAGES_PAGE, "Image not found"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update image status");
            views::redirect_error(IMAGES_PAGE, "Failed to update image status")
        }
    }
}

/// GET /admin/images/serve/{filename}
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (image, bytes) = state.images().read_any(&filename).await?;

    Ok((
        [
            (header::CONTENT_TYPE, image.mime_type),
            (header::CACHE_CONTROL, "private, no-cache".to_string()),
        ],
        Body::from(bytes),
    )
        .into_response())
}
