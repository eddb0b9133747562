//! Domain service for credentials: admin passwords and API keys.

use thiserror::Error;

use crate::db::{AdminUser, ApiKey};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Admin account already exists")]
    AlreadyInitialized,

    #[error("API key not found")]
    KeyNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// An API key together with its raw token. Only ever built at creation time.
#[derive(Debug, Clone)]
pub struct IssuedApiKey {
    pub key: ApiKey,
    pub token: String,
}

/// Key record plus request count for the admin listing.
#[derive(Debug, Clone)]
pub struct ApiKeyUsage {
    pub key: ApiKey,
    pub request_count: u64,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn has_admin(&self) -> Result<bool, AuthError>;

    /// Creates the one admin account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AlreadyInitialized`] if an admin exists,
    /// [`AuthError::Validation`] on a too short username or password.
    async fn create_first_admin(&self, username: &str, password: &str)
    -> Result<AdminUser, AuthError>;

    /// Unknown user and wrong password both give `Ok(None)`.
    async fn verify_admin_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AdminUser>, AuthError>;

    /// Looks up an enabled key by raw token and records its use in the
    /// background. The background update never affects the result.
    async fn verify_api_key(&self, token: &str) -> Result<Option<ApiKey>, AuthError>;

    async fn create_api_key(&self, name: &str) -> Result<IssuedApiKey, AuthError>;

    /// Deletes the key and creates a new one with the same name.
    async fn regenerate_api_key(&self, id: i32) -> Result<IssuedApiKey, AuthError>;

    async fn set_api_key_enabled(&self, id: i32, enabled: bool) -> Result<(), AuthError>;

    async fn delete_api_key(&self, id: i32) -> Result<(), AuthError>;

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyUsage>, AuthError>;

    /// Appends to the request log. Callers treat failure as non-fatal.
    async fn record_request(&self, api_key_id: i32, image_count: usize) -> Result<(), AuthError>;
}
