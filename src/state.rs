use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, ImageService, SeaOrmAuthService, SessionManager, SettingsService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub image_service: Arc<ImageService>,

    pub settings_service: Arc<SettingsService>,

    pub sessions: SessionManager,
}

impl SharedState {
    /// Connects the store, applies migrations, seeds default settings and
    /// makes sure the upload directory exists.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let settings_service = Arc::new(SettingsService::new(store.clone()));
        settings_service
            .seed_defaults()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed default settings: {e}"))?;

        let image_service = Arc::new(ImageService::new(store.clone(), config.upload_path()?));
        image_service
            .ensure_upload_dir()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create upload directory: {e}"))?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        if config.security.session_secret.is_none() {
            tracing::warn!("No session secret configured, admin sessions will not survive a restart");
        }
        let sessions = SessionManager::new(
            config.security.session_secret.as_deref(),
            config.server.secure_cookies,
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
            image_service,
            settings_service,
            sessions,
        })
    }
}
