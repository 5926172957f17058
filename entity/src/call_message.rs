use sea_orm::entity::prelude::*;

/// Append-only log of messages relayed through a call, persisted for
/// retention and reporting. Rows are never mutated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "call_message")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub call_id: String,
    pub author_id: String,
    pub author_username: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub attachment_url: Option<String>,
    pub created_at: DateTimeUtc,
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
