use sea_orm::entity::prelude::*;

/// A named group of channels across servers that mirror each other's messages.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "hub")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    /// Channel receiving moderation log entries, if configured.
    pub mod_log_channel_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::connection::Entity")]
    Connection,
    #[sea_orm(has_many = "super::hub_message::Entity")]
    HubMessage,
}

impl Related<super::connection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Connection.def()
    }
}

impl Related<super::hub_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HubMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
