use anyhow::{Context, Result};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use sha2::{Digest, Sha256};

use crate::constants::limits::API_TOKEN_BYTES;
use crate::entities::{api_keys, api_requests};

/// API key record as seen by the rest of the application. The key hash stays
/// inside the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub id: i32,
    pub name: String,
    pub enabled: bool,
    pub created_at: String,
    pub last_used_at: Option<String>,
}

impl From<api_keys::Model> for ApiKey {
    fn from(model: api_keys::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            enabled: model.enabled,
            created_at: model.created_at,
            last_used_at: model.last_used_at,
        }
    }
}

pub struct ApiKeyRepository {
    conn: DatabaseConnection,
}

impl ApiKeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates a key and returns it together with the raw token.
    /// The raw token is not recoverable afterwards.
    pub async fn create(&self, name: &str) -> Result<(ApiKey, String)> {
        let raw_token = generate_api_token();

        let model = api_keys::ActiveModel {
            key_hash: Set(hash_api_token(&raw_token)),
            name: Set(name.to_string()),
            enabled: Set(true),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            last_used_at: Set(None),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert API key")?;

        Ok((ApiKey::from(model), raw_token))
    }

    /// Looks up an enabled key by raw token. Disabled keys never match.
    pub async fn find_enabled_by_token(&self, raw_token: &str) -> Result<Option<ApiKey>> {
        let key = api_keys::Entity::find()
            .filter(api_keys::Column::KeyHash.eq(hash_api_token(raw_token)))
            .filter(api_keys::Column::Enabled.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query API key by hash")?;

        Ok(key.map(ApiKey::from))
    }

    pub async fn get(&self, id: i32) -> Result<Option<ApiKey>> {
        let key = api_keys::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query API key by ID")?;

        Ok(key.map(ApiKey::from))
    }

    pub async fn list(&self) -> Result<Vec<ApiKey>> {
        let keys = api_keys::Entity::find()
            .order_by_desc(api_keys::Column::CreatedAt)
            .order_by_desc(api_keys::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list API keys")?;

        Ok(keys.into_iter().map(ApiKey::from).collect())
    }

    pub async fn touch_last_used(&self, id: i32) -> Result<()> {
        api_keys::Entity::update_many()
            .col_expr(
                api_keys::Column::LastUsedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(api_keys::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update API key last used")?;

        Ok(())
    }

    /// Returns `false` if no key has the given ID.
    pub async fn set_enabled(&self, id: i32, enabled: bool) -> Result<bool> {
        let result = api_keys::Entity::update_many()
            .col_expr(api_keys::Column::Enabled, Expr::value(enabled))
            .filter(api_keys::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update API key enabled status")?;

        Ok(result.rows_affected > 0)
    }

    /// Deletes the key and its request log. Returns `false` if no key has the given ID.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        api_requests::Entity::delete_many()
            .filter(api_requests::Column::ApiKeyId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete API key request log")?;

        let result = api_keys::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete API key")?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn log_request(&self, api_key_id: i32, image_count: usize) -> Result<()> {
        api_requests::ActiveModel {
            api_key_id: Set(api_key_id),
            timestamp: Set(chrono::Utc::now().to_rfc3339()),
            image_count: Set(i32::try_from(image_count).unwrap_or(i32::MAX)),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to log API request")?;

        Ok(())
    }

    pub async fn usage_count(&self, api_key_id: i32) -> Result<u64> {
        api_requests::Entity::find()
            .filter(api_requests::Column::ApiKeyId.eq(api_key_id))
            .count(&self.conn)
            .await
            .context("Failed to count API requests for key")
    }

    pub async fn total_usage_count(&self) -> Result<u64> {
        api_requests::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count API requests")
    }
}

/// Generate a raw API token: 32 random bytes, hex encoded (64 chars).
#[must_use]
pub fn generate_api_token() -> String {
    let bytes: [u8; API_TOKEN_BYTES] = rand::rng().random();
    hex::encode(bytes)
}

/// Tokens are high-entropy, so a fast digest is enough for lookup.
#[must_use]
pub fn hash_api_token(raw_token: &str) -> String {
    hex::encode(Sha256::digest(raw_token.as_bytes()))
}
