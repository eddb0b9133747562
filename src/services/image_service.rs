//! Image catalogue: files in the upload directory mirrored by `image_files` rows.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::constants::VALID_IMAGE_TYPES;
use crate::constants::limits::MAX_FILENAME_LEN;
use crate::db::{ImageFile, Store};
use crate::services::settings::RuntimeSettings;

const INVALID_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid file type: {0}")]
    InvalidType(String),

    #[error("Invalid filename format")]
    InvalidFilename,

    #[error("Image not found")]
    NotFound,

    #[error("File with new name already exists")]
    AlreadyExists,

    #[error("Requested count ({requested}) exceeds maximum allowed ({max})")]
    CountAboveMax { requested: u64, max: u64 },

    #[error("Requested count ({requested}) exceeds total images ({available})")]
    CountAboveAvailable { requested: u64, available: u64 },

    #[error("File system error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ImageError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<std::io::Error> for ImageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CatalogueSummary {
    pub images: Vec<ImageFile>,
    pub total_size: i64,
    pub enabled_count: u64,
}

pub struct ImageService {
    store: Store,
    upload_dir: PathBuf,
}

impl ImageService {
    #[must_use]
    pub const fn new(store: Store, upload_dir: PathBuf) -> Self {
        Self { store, upload_dir }
    }

    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn ensure_upload_dir(&self) -> Result<(), ImageError> {
        fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }

    /// Stores an uploaded file, suffixing `_1`, `_2`, ... before the
    /// extension until the name is free. Returns the stored record.
    pub async fn save_upload(
        &self,
        original_name: &str,
        declared_type: Option<&str>,
        data: &[u8],
    ) -> Result<ImageFile, ImageError> {
        let base_name = base_name(original_name).ok_or(ImageError::InvalidFilename)?;
        if !is_valid_filename(base_name) {
            return Err(ImageError::InvalidFilename);
        }

        let mime_type = resolve_mime_type(base_name, declared_type)?;

        self.ensure_upload_dir().await?;
        let (filename, path) = self.claim_filename(base_name).await?;

        if let Err(e) = write_all(&path, data).await {
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }

        let size = i64::try_from(data.len()).unwrap_or(i64::MAX);
        match self.store.add_image(&filename, size, &mime_type).await {
            Ok(image) => {
                info!(filename = %image.filename, size, mime_type = %image.mime_type, "Image uploaded");
                Ok(image)
            }
            Err(e) => {
                let _ = fs::remove_file(&path).await;
                Err(e.into())
            }
        }
    }

    /// Atomically creates an empty file under the first free candidate name.
    async fn claim_filename(&self, base_name: &str) -> Result<(String, PathBuf), ImageError> {
        let mut counter = 0u32;
        loop {
            let candidate = suffixed_name(base_name, counter);
            counter += 1;

            if self.store.image_filename_exists(&candidate).await? {
                continue;
            }

            let path = self.upload_dir.join(&candidate);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok((candidate, path)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn rename(&self, old_filename: &str, new_filename: &str) -> Result<(), ImageError> {
        let old_filename = exact_base_name(old_filename)?;
        let new_filename = new_filename.trim();
        if !is_valid_filename(new_filename) {
            return Err(ImageError::InvalidFilename);
        }

        let image = self
            .store
            .get_image_by_filename(old_filename)
            .await?
            .ok_or(ImageError::NotFound)?;

        let old_path = self.upload_dir.join(old_filename);
        let new_path = self.upload_dir.join(new_filename);

        if !fs::try_exists(&old_path).await? {
            return Err(ImageError::NotFound);
        }
        if fs::try_exists(&new_path).await?
            || self.store.image_filename_exists(new_filename).await?
        {
            return Err(ImageError::AlreadyExists);
        }

        fs::rename(&old_path, &new_path).await?;

        if let Err(e) = self.store.rename_image(image.id, new_filename).await {
            if let Err(revert) = fs::rename(&new_path, &old_path).await {
                warn!(error = %revert, from = %new_filename, to = %old_filename, "Failed to revert file rename");
            }
            return Err(e.into());
        }

        info!(from = %old_filename, to = %new_filename, "Image renamed");
        Ok(())
    }

    /// Removes the row, then the file. A file that cannot be removed is only logged.
    pub async fn delete(&self, filename: &str) -> Result<(), ImageError> {
        let filename = exact_base_name(filename)?;
        let image = self
            .store
            .get_image_by_filename(filename)
            .await?
            .ok_or(ImageError::NotFound)?;

        self.store.delete_image(image.id).await?;

        let path = self.upload_dir.join(filename);
        if let Err(e) = fs::remove_file(&path).await {
            warn!(error = %e, path = %path.display(), "Failed to delete image file");
        }

        info!(filename = %filename, "Image deleted");
        Ok(())
    }

    pub async fn set_enabled(&self, filename: &str, enabled: bool) -> Result<(), ImageError> {
        let filename = exact_base_name(filename)?;
        let image = self
            .store
            .get_image_by_filename(filename)
            .await?
            .ok_or(ImageError::NotFound)?;

        self.store.set_image_enabled(image.id, enabled).await?;
        info!(filename = %filename, enabled, "Image status changed");
        Ok(())
    }

    pub async fn summary(&self) -> Result<CatalogueSummary, ImageError> {
        let images = self.store.list_images().await?;
        let total_size = images.iter().map(|i| i.size).sum();
        let enabled_count = images.iter().filter(|i| i.enabled).count() as u64;

        Ok(CatalogueSummary {
            images,
            total_size,
            enabled_count,
        })
    }

    /// Picks `count` distinct enabled images. The count is checked against
    /// the configured maximum first, then against what is available.
    pub async fn pick_random(
        &self,
        raw_count: Option<&str>,
        settings: &RuntimeSettings,
    ) -> Result<Vec<ImageFile>, ImageError> {
        let requested = resolve_count(raw_count, settings)?;

        let available = self.store.count_enabled_images().await?;
        if requested > available {
            return Err(ImageError::CountAboveAvailable {
                requested,
                available,
            });
        }

        Ok(self.store.random_enabled_images(requested).await?)
    }

    /// Reads an enabled image. Disabled rows and missing files are both not found.
    pub async fn read_enabled(&self, requested: &str) -> Result<(ImageFile, Vec<u8>), ImageError> {
        self.read(requested, true).await
    }

    /// Reads any catalogued image regardless of its enabled flag.
    pub async fn read_any(&self, requested: &str) -> Result<(ImageFile, Vec<u8>), ImageError> {
        self.read(requested, false).await
    }

    async fn read(
        &self,
        requested: &str,
        enabled_only: bool,
    ) -> Result<(ImageFile, Vec<u8>), ImageError> {
        let filename = base_name(requested).ok_or(ImageError::NotFound)?;

        let image = self
            .store
            .get_image_by_filename(filename)
            .await?
            .filter(|image| image.enabled || !enabled_only)
            .ok_or(ImageError::NotFound)?;

        match fs::read(self.upload_dir.join(&image.filename)).await {
            Ok(bytes) => Ok((image, bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ImageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_all(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new().write(true).open(path).await?;
    file.write_all(data).await?;
    file.flush().await
}

/// A missing or non-numeric count falls back to the configured default.
pub fn resolve_count(raw: Option<&str>, settings: &RuntimeSettings) -> Result<u64, ImageError> {
    let requested = raw
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(settings.default_image_count);

    if requested > settings.max_image_count {
        return Err(ImageError::CountAboveMax {
            requested,
            max: settings.max_image_count,
        });
    }

    Ok(requested)
}

/// Final path component, or `None` for empty and dot-only names.
#[must_use]
pub fn base_name(name: &str) -> Option<&str> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    (!last.is_empty() && last != "." && last != "..").then_some(last)
}

fn exact_base_name(name: &str) -> Result<&str, ImageError> {
    match base_name(name) {
        Some(base) if base == name.trim() => Ok(base),
        _ => Err(ImageError::InvalidFilename),
    }
}

#[must_use]
pub fn is_valid_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_FILENAME_LEN
        && name != "."
        && name != ".."
        && !name.contains(INVALID_FILENAME_CHARS)
}

fn resolve_mime_type(filename: &str, declared: Option<&str>) -> Result<String, ImageError> {
    let declared = declared
        .map(str::trim)
        .filter(|d| !d.is_empty() && *d != "application/octet-stream");

    let mime_type = declared.map_or_else(
        || {
            mime_guess::from_path(filename)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string()
        },
        str::to_ascii_lowercase,
    );

    if VALID_IMAGE_TYPES.contains(&mime_type.as_str()) {
        Ok(mime_type)
    } else {
        Err(ImageError::InvalidType(mime_type))
    }
}

fn suffixed_name(name: &str, counter: u32) -> String {
    if counter == 0 {
        return name.to_string();
    }

    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}_{counter}{}", &name[..dot], &name[dot..]),
        _ => format!("{name}_{counter}"),
    }
}
