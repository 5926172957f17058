use sea_orm::entity::prelude::*;

/// A (channel, hub) membership with the webhook used to deliver mirrored
/// messages. `parent_channel_id` is set when the connection lives in a
/// thread; the webhook then belongs to the parent channel and deliveries
/// target the thread.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "connection")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub hub_id: String,
    #[sea_orm(unique)]
    pub channel_id: String,
    pub guild_id: String,
    pub webhook_url: String,
    pub parent_channel_id: Option<String>,
    pub connected: bool,
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
}

impl Related<super::hub::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hub.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
