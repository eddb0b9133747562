//! Runtime policy stored in the `settings` table.
//!
//! The table is read on every request that needs a policy decision, so an
//! admin change is visible to the very next request.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::constants::settings as keys;
use crate::db::Store;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SettingsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Typed snapshot of the settings table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub require_api_key_for_images: bool,
    pub default_image_count: u64,
    pub max_image_count: u64,
    pub cors_enabled: bool,
    pub cors_origins: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            require_api_key_for_images: true,
            default_image_count: 20,
            max_image_count: 100,
            cors_enabled: true,
            cors_origins: "*".to_string(),
        }
    }
}

impl RuntimeSettings {
    /// Missing or unparsable values take the default.
    #[must_use]
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| map.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        Self {
            require_api_key_for_images: get(keys::REQUIRE_API_KEY_FOR_IMAGES)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.require_api_key_for_images),
            default_image_count: get(keys::DEFAULT_IMAGE_COUNT)
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.default_image_count),
            max_image_count: get(keys::MAX_IMAGE_COUNT)
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_image_count),
            cors_enabled: get(keys::CORS_ENABLED)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cors_enabled),
            cors_origins: get(keys::CORS_ORIGINS)
                .map_or(defaults.cors_origins, ToString::to_string),
        }
    }

    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                keys::REQUIRE_API_KEY_FOR_IMAGES,
                self.require_api_key_for_images.to_string(),
            ),
            (keys::DEFAULT_IMAGE_COUNT, self.default_image_count.to_string()),
            (keys::MAX_IMAGE_COUNT, self.max_image_count.to_string()),
            (keys::CORS_ENABLED, self.cors_enabled.to_string()),
            (keys::CORS_ORIGINS, self.cors_origins.clone()),
        ]
    }
}

/// Body of the admin settings form. Checkboxes are absent when unticked.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    pub require_api_key_for_images: Option<String>,
    #[serde(default)]
    pub default_image_count: String,
    #[serde(default)]
    pub max_image_count: String,
    pub cors_enabled: Option<String>,
    #[serde(default)]
    pub cors_origins: String,
}

impl SettingsForm {
    pub fn validate(&self) -> Result<RuntimeSettings, SettingsError> {
        let defaults = RuntimeSettings::default();

        let default_image_count = parse_count(
            &self.default_image_count,
            defaults.default_image_count,
            "Default image count must be a positive number",
        )?;
        let max_image_count = parse_count(
            &self.max_image_count,
            defaults.max_image_count,
            "Maximum image count must be a positive number",
        )?;

        if default_image_count > max_image_count {
            return Err(SettingsError::Validation(
                "Default image count cannot be greater than maximum image count".to_string(),
            ));
        }

        let cors_origins = match self.cors_origins.trim() {
            "" => defaults.cors_origins,
            origins => origins.to_string(),
        };

        Ok(RuntimeSettings {
            require_api_key_for_images: is_checked(self.require_api_key_for_images.as_deref()),
            default_image_count,
            max_image_count,
            cors_enabled: is_checked(self.cors_enabled.as_deref()),
            cors_origins,
        })
    }
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(value, Some("on" | "true"))
}

fn parse_count(raw: &str, fallback: u64, message: &str) -> Result<u64, SettingsError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(fallback);
    }

    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SettingsError::Validation(message.to_string())),
    }
}

pub struct SettingsService {
    store: Store,
}

impl SettingsService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<RuntimeSettings, SettingsError> {
        let map = self.store.all_settings().await?;
        Ok(RuntimeSettings::from_map(&map))
    }

    /// Falls back to the defaults when the store cannot be read.
    /// The defaults require an API key, so a failure never opens the API.
    pub async fn load_or_default(&self) -> RuntimeSettings {
        match self.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                RuntimeSettings::default()
            }
        }
    }

    /// Inserts defaults for absent keys. Existing values are left alone.
    pub async fn seed_defaults(&self) -> Result<(), SettingsError> {
        let pairs = RuntimeSettings::default().to_pairs();
        self.store.seed_settings(&pairs).await?;
        Ok(())
    }

    /// Writes every key atomically; a failure leaves the previous values intact.
    pub async fn save(&self, settings: &RuntimeSettings) -> Result<(), SettingsError> {
        self.store.save_settings(&settings.to_pairs()).await?;
        Ok(())
    }
}
