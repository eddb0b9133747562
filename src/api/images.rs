use axum::{
    Extension, Json,
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::ImageAccess;
use super::{ApiError, AppState, ImageLink, RandomImagesResponse};
use crate::services::RuntimeSettings;

#[derive(Debug, Deserialize)]
pub struct RandomImagesQuery {
    pub count: Option<String>,
}

/// GET /api/images
pub async fn random_images(
    State(state): State<Arc<AppState>>,
    Extension(access): Extension<ImageAccess>,
    Extension(settings): Extension<RuntimeSettings>,
    Query(query): Query<RandomImagesQuery>,
) -> Result<Json<RandomImagesResponse>, ApiError> {
    let images = state
        .images()
        .pick_random(query.count.as_deref(), &settings)
        .await?;

    if let Some(key) = access.api_key()
        && let Err(e) = state.auth().record_request(key.id, images.len()).await
    {
        tracing::warn!(key_id = key.id, error = %e, "Failed to log API request");
    }

    metrics::counter!("images_served_total", "endpoint" => "random").increment(images.len() as u64);

    let images: Vec<ImageLink> = images
        .into_iter()
        .map(|image| ImageLink {
            url: image_url(&image.filename),
            filename: image.filename,
        })
        .collect();

    Ok(Json(RandomImagesResponse {
        count: images.len(),
        images,
    }))
}

/// Public URL of a stored image; the filename is a single encoded path segment.
fn image_url(filename: &str) -> String {
    format!("/api/images/{}", urlencoding::encode(filename))
}

/// GET /api/images/{filename}
pub async fn serve_image(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (image, bytes) = state.images().read_enabled(&filename).await?;

    metrics::counter!("images_served_total", "endpoint" => "file").increment(1);

    Ok((
        [
            (header::CONTENT_TYPE, image.mime_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        Body::from(bytes),
    )
        .into_response())
}
