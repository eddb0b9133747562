use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::admin::AdminUser;
pub use repositories::api_key::ApiKey;
pub use repositories::image::ImageFile;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to an in-memory database is a separate database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    fn api_key_repo(&self) -> repositories::api_key::ApiKeyRepository {
        repositories::api_key::ApiKeyRepository::new(self.conn.clone())
    }

    fn image_repo(&self) -> repositories::image::ImageRepository {
        repositories::image::ImageRepository::new(self.conn.clone())
    }

    fn settings_repo(&self) -> repositories::settings::SettingsRepository {
        repositories::settings::SettingsRepository::new(self.conn.clone())
    }

    // Admin users

    pub async fn has_admin(&self) -> Result<bool> {
        self.admin_repo().has_any().await
    }

    pub async fn create_first_admin(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Option<AdminUser>> {
        self.admin_repo()
            .create_first(username, password, security)
            .await
    }

    pub async fn verify_admin_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AdminUser>> {
        self.admin_repo().verify_password(username, password).await
    }

    // API keys

    pub async fn create_api_key(&self, name: &str) -> Result<(ApiKey, String)> {
        self.api_key_repo().create(name).await
    }

    pub async fn find_enabled_api_key(&self, raw_token: &str) -> Result<Option<ApiKey>> {
        self.api_key_repo().find_enabled_by_token(raw_token).await
    }

    pub async fn get_api_key(&self, id: i32) -> Result<Option<ApiKey>> {
        self.api_key_repo().get(id).await
    }

    pub async fn list_api_keys(&self) -> Result<Vec<ApiKey>> {
        self.api_key_repo().list().await
    }

    pub async fn touch_api_key(&self, id: i32) -> Result<()> {
        self.api_key_repo().touch_last_used(id).await
    }

    pub async fn set_api_key_enabled(&self, id: i32, enabled: bool) -> Result<bool> {
        self.api_key_repo().set_enabled(id, enabled).await
    }

    pub async fn delete_api_key(&self, id: i32) -> Result<bool> {
        self.api_key_repo().delete(id).await
    }

    pub async fn log_api_request(&self, api_key_id: i32, image_count: usize) -> Result<()> {
        self.api_key_repo().log_request(api_key_id, image_count).await
    }

    pub async fn api_key_usage(&self, api_key_id: i32) -> Result<u64> {
        self.api_key_repo().usage_count(api_key_id).await
    }

    pub async fn total_api_requests(&self) -> Result<u64> {
        self.api_key_repo().total_usage_count().await
    }

    // Images

    pub async fn add_image(&self, filename: &str, size: i64, mime_type: &str) -> Result<ImageFile> {
        self.image_repo().create(filename, size, mime_type).await
    }

    pub async fn get_image_by_filename(&self, filename: &str) -> Result<Option<ImageFile>> {
        self.image_repo().get_by_filename(filename).await
    }

    pub async fn image_filename_exists(&self, filename: &str) -> Result<bool> {
        self.image_repo().filename_exists(filename).await
    }

    pub async fn list_images(&self) -> Result<Vec<ImageFile>> {
        self.image_repo().list().await
    }

    pub async fn random_enabled_images(&self, count: u64) -> Result<Vec<ImageFile>> {
        self.image_repo().random_enabled(count).await
    }

    pub async fn count_enabled_images(&self) -> Result<u64> {
        self.image_repo().count_enabled().await
    }

    pub async fn count_images(&self) -> Result<u64> {
        self.image_repo().count().await
    }

    pub async fn set_image_enabled(&self, id: i32, enabled: bool) -> Result<bool> {
        self.image_repo().set_enabled(id, enabled).await
    }

    pub async fn rename_image(&self, id: i32, new_filename: &str) -> Result<bool> {
        self.image_repo().rename(id, new_filename).await
    }

    pub async fn delete_image(&self, id: i32) -> Result<bool> {
        self.image_repo().delete(id).await
    }

    // Settings

    pub async fn all_settings(&self) -> Result<HashMap<String, String>> {
        self.settings_repo().all().await
    }

    pub async fn save_settings(&self, pairs: &[(&str, String)]) -> Result<()> {
        self.settings_repo().upsert_all(pairs).await
    }

    pub async fn seed_settings(&self, pairs: &[(&str, String)]) -> Result<()> {
        self.settings_repo().insert_missing(pairs).await
    }
}
