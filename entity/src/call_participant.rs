use sea_orm::entity::prelude::*;

/// One side of a call. `users` is a JSON array of every distinct user id
/// that has sent a message from this channel during the call; it only grows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "call_participant")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub call_id: String,
    pub channel_id: String,
    pub guild_id: String,
    pub webhook_url: String,
    pub users: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::call::Entity",
        from = "Column::CallId",
        to = "super::call::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Call,
}

impl Related<super::call::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Call.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
