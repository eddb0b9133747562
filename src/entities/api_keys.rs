use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Hex SHA-256 of the raw token. The token itself is never stored.
    #[sea_orm(unique)]
    pub key_hash: String,

    pub name: String,

    pub enabled: bool,

    pub created_at: String,

    pub last_used_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::api_requests::Entity")]
    ApiRequests,
}

impl Related<super::api_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
