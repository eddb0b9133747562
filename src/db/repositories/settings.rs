use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, Set, TransactionTrait, sea_query::OnConflict};

use crate::entities::{prelude::*, settings};

pub struct SettingsRepository {
    conn: DatabaseConnection,
}

impl SettingsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn all(&self) -> Result<HashMap<String, String>> {
        let rows = Settings::find()
            .all(&self.conn)
            .await
            .context("Failed to read settings")?;

        Ok(rows.into_iter().map(|r| (r.key, r.value)).collect())
    }

    /// Inserts or overwrites every pair in one transaction.
    pub async fn upsert_all(&self, pairs: &[(&str, String)]) -> Result<()> {
        let txn = self.conn.begin().await?;

        for (key, value) in pairs {
            let model = settings::ActiveModel {
                key: Set((*key).to_string()),
                value: Set(value.clone()),
                ..Default::default()
            };

            Settings::insert(model)
                .on_conflict(
                    OnConflict::column(settings::Column::Key)
                        .update_column(settings::Column::Value)
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .with_context(|| format!("Failed to save setting: {key}"))?;
        }

        txn.commit().await.context("Failed to commit settings")?;
        Ok(())
    }

    /// Inserts each pair unless the key already has a value.
    pub async fn insert_missing(&self, pairs: &[(&str, String)]) -> Result<()> {
        for (key, value) in pairs {
            let model = settings::ActiveModel {
                key: Set((*key).to_string()),
                value: Set(value.clone()),
                ..Default::default()
            };

            Settings::insert(model)
                .on_conflict(
                    OnConflict::column(settings::Column::Key)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.conn)
                .await
                .with_context(|| format!("Failed to seed setting: {key}"))?;
        }

        Ok(())
    }
}
