//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::constants::limits::{MAX_KEY_NAME_LEN, MIN_PASSWORD_LEN, MIN_USERNAME_LEN};
use crate::db::{AdminUser, ApiKey, Store};
use crate::services::auth_service::{ApiKeyUsage, AuthError, AuthService, IssuedApiKey};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

fn validate_key_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("API key name is required".to_string()));
    }
    if name.chars().count() > MAX_KEY_NAME_LEN {
        return Err(AuthError::Validation(format!(
            "API key name must be at most {MAX_KEY_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn has_admin(&self) -> Result<bool, AuthError> {
        Ok(self.store.has_admin().await?)
    }

    async fn create_first_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminUser, AuthError> {
        let username = username.trim();

        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(AuthError::Validation(format!(
                "Username must be at least {MIN_USERNAME_LEN} characters"
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let user = self
            .store
            .create_first_admin(username, password, &self.security)
            .await?
            .ok_or(AuthError::AlreadyInitialized)?;

        info!(username = %user.username, "Admin account created");
        Ok(user)
    }

    async fn verify_admin_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AdminUser>, AuthError> {
        Ok(self.store.verify_admin_password(username, password).await?)
    }

    async fn verify_api_key(&self, token: &str) -> Result<Option<ApiKey>, AuthError> {
        let Some(key) = self.store.find_enabled_api_key(token).await? else {
            metrics::counter!("api_key_auth_total", "result" => "rejected").increment(1);
            return Ok(None);
        };

        metrics::counter!("api_key_auth_total", "result" => "accepted").increment(1);

        let store = self.store.clone();
        let key_id = key.id;
        tokio::spawn(async move {
            if let Err(e) = store.touch_api_key(key_id).await {
                warn!(key_id, error = %e, "Failed to update API key last used");
            }
        });

        Ok(Some(key))
    }

    async fn create_api_key(&self, name: &str) -> Result<IssuedApiKey, AuthError> {
        let name = validate_key_name(name)?;
        let (key, token) = self.store.create_api_key(name).await?;

        info!(key_id = key.id, name = %key.name, "API key created");
        Ok(IssuedApiKey { key, token })
    }

    async fn regenerate_api_key(&self, id: i32) -> Result<IssuedApiKey, AuthError> {
        let existing = self
            .store
            .get_api_key(id)
            .await?
            .ok_or(AuthError::KeyNotFound)?;

        self.store.delete_api_key(id).await?;
        let (key, token) = self.store.create_api_key(&existing.name).await?;

        info!(old_key_id = id, key_id = key.id, name = %key.name, "API key regenerated");
        Ok(IssuedApiKey { key, token })
    }

    async fn set_api_key_enabled(&self, id: i32, enabled: bool) -> Result<(), AuthError> {
        if !self.store.set_api_key_enabled(id, enabled).await? {
            return Err(AuthError::KeyNotFound);
        }
        info!(key_id = id, enabled, "API key status changed");
        Ok(())
    }

    async fn delete_api_key(&self, id: i32) -> Result<(), AuthError> {
        if !self.store.delete_api_key(id).await? {
            return Err(AuthError::KeyNotFound);
        }
        info!(key_id = id, "API key deleted");
        Ok(())
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyUsage>, AuthError> {
        let keys = self.store.list_api_keys().await?;
        let mut listed = Vec::with_capacity(keys.len());

        for key in keys {
            let request_count = match self.store.api_key_usage(key.id).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(key_id = key.id, error = %e, "Failed to count API key usage");
                    0
                }
            };
            listed.push(ApiKeyUsage { key, request_count });
        }

        Ok(listed)
    }

    async fn record_request(&self, api_key_id: i32, image_count: usize) -> Result<(), AuthError> {
        Ok(self.store.log_api_request(api_key_id, image_count).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name_is_trimmed() {
        assert_eq!(validate_key_name("  mobile app ").unwrap(), "mobile app");
    }

    #[test]
    fn test_key_name_bounds() {
        assert!(validate_key_name("   ").is_err());
        assert!(validate_key_name(&"k".repeat(MAX_KEY_NAME_LEN)).is_ok());
        assert!(validate_key_name(&"k".repeat(MAX_KEY_NAME_LEN + 1)).is_err());
    }
}
