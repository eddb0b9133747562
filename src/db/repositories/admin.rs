use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::admin_users;

/// Admin record without the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub created_at: String,
}

impl From<admin_users::Model> for AdminUser {
    fn from(model: admin_users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            created_at: model.created_at,
        }
    }
}

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn has_any(&self) -> Result<bool> {
        let count = admin_users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count admin users")?;

        Ok(count > 0)
    }

    /// Creates the first admin. Returns `None` when an admin already exists.
    pub async fn create_first(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Option<AdminUser>> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let txn = self.conn.begin().await?;

        let existing = admin_users::Entity::find()
            .count(&txn)
            .await
            .context("Failed to count admin users")?;
        if existing > 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let user = admin_users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert admin user")?;

        txn.commit().await?;

        Ok(Some(AdminUser::from(user)))
    }

    /// Checks a password against the stored hash.
    /// Unknown users and wrong passwords both yield `None`.
    /// Note: Argon2 verification runs in `spawn_blocking` because it is CPU-bound.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<Option<AdminUser>> {
        let user = admin_users::Entity::find()
            .filter(admin_users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_password_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        Ok(is_valid.then(|| AdminUser::from(user)))
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// The cost parameters are read back from the PHC string, so hashes made with
/// older settings still verify.
pub fn verify_password_hash(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
