use crate::entities::prelude::*;
use crate::entities::api_requests;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(AdminUsers)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ApiKeys)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ApiRequests)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ImageFiles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Settings)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_requests_key_id")
                    .table(ApiRequests)
                    .col(api_requests::Column::ApiKeyId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_requests_timestamp")
                    .table(ApiRequests)
                    .col(api_requests::Column::Timestamp)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiRequests).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiKeys).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminUsers).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ImageFiles).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Settings).if_exists().to_owned())
            .await
    }
}
