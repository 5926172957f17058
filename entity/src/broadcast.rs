use sea_orm::entity::prelude::*;

/// One delivered copy of a hub message: the channel it was sent to and the
/// id of the webhook message created there. Edit, delete, and reaction
/// propagation walk these rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "broadcast")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub hub_message_id: String,
    pub channel_id: String,
    pub message_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hub_message::Entity",
        from = "Column::HubMessageId",
        to = "super::hub_message::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    HubMessage,
}

impl Related<super::hub_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HubMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
