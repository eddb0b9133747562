use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};

use crate::entities::{image_files, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub id: i32,
    pub filename: String,
    pub size: i64,
    pub mime_type: String,
    pub enabled: bool,
    pub uploaded_at: String,
}

impl From<image_files::Model> for ImageFile {
    fn from(model: image_files::Model) -> Self {
        Self {
            id: model.id,
            filename: model.filename,
            size: model.size,
            mime_type: model.mime_type,
            enabled: model.enabled,
            uploaded_at: model.uploaded_at,
        }
    }
}

pub struct ImageRepository {
    conn: DatabaseConnection,
}

impl ImageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, filename: &str, size: i64, mime_type: &str) -> Result<ImageFile> {
        let model = image_files::ActiveModel {
            filename: Set(filename.to_string()),
            size: Set(size),
            mime_type: Set(mime_type.to_string()),
            enabled: Set(true),
            uploaded_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .with_context(|| format!("Failed to insert image record: {filename}"))?;

        Ok(ImageFile::from(model))
    }

    pub async fn get_by_filename(&self, filename: &str) -> Result<Option<ImageFile>> {
        let image = ImageFiles::find()
            .filter(image_files::Column::Filename.eq(filename))
            .one(&self.conn)
            .await
            .context("Failed to query image by filename")?;

        Ok(image.map(ImageFile::from))
    }

    pub async fn filename_exists(&self, filename: &str) -> Result<bool> {
        let count = ImageFiles::find()
            .filter(image_files::Column::Filename.eq(filename))
            .count(&self.conn)
            .await
            .context("Failed to check image filename")?;

        Ok(count > 0)
    }

    /// All images, newest upload first.
    pub async fn list(&self) -> Result<Vec<ImageFile>> {
        let images = ImageFiles::find()
            .order_by_desc(image_files::Column::UploadedAt)
            .order_by_desc(image_files::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list images")?;

        Ok(images.into_iter().map(ImageFile::from).collect())
    }

    /// Up to `count` distinct enabled images in random order.
    pub async fn random_enabled(&self, count: u64) -> Result<Vec<ImageFile>> {
        let images = ImageFiles::find()
            .filter(image_files::Column::Enabled.eq(true))
            .order_by_asc(Expr::cust("RANDOM()"))
            .limit(count)
            .all(&self.conn)
            .await
            .context("Failed to select random images")?;

        Ok(images.into_iter().map(ImageFile::from).collect())
    }

    pub async fn count_enabled(&self) -> Result<u64> {
        ImageFiles::find()
            .filter(image_files::Column::Enabled.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count enabled images")
    }

    pub async fn count(&self) -> Result<u64> {
        ImageFiles::find()
            .count(&self.conn)
            .await
            .context("Failed to count images")
    }

    /// Returns `false` if no image has the given ID.
    pub async fn set_enabled(&self, id: i32, enabled: bool) -> Result<bool> {
        let result = ImageFiles::update_many()
            .col_expr(image_files::Column::Enabled, Expr::value(enabled))
            .filter(image_files::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update image enabled status")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn rename(&self, id: i32, new_filename: &str) -> Result<bool> {
        let result = ImageFiles::update_many()
            .col_expr(image_files::Column::Filename, Expr::value(new_filename))
            .filter(image_files::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to rename image record")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = ImageFiles::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete image record")?;

        Ok(result.rows_affected > 0)
    }
}
