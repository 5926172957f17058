use sea_orm::entity::prelude::*;

/// The original message behind a hub broadcast. The primary key is the
/// Discord id of the origin message; `reactions` holds the aggregated
/// reaction map (`emoji -> [user ids]`) shared by every copy.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "hub_message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub hub_id: String,
    pub author_id: String,
    pub author_username: String,
    pub channel_id: String,
    pub guild_id: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub reactions: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hub::Entity",
        from = "Column::HubId",
        to = "super::hub::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Hub,
    #[sea_orm(has_many = "super::broadcast::Entity")]
    Broadcast,
}

impl Related<super::hub::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hub.def()
    }
}

impl Related<super::broadcast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Broadcast.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
