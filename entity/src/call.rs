use sea_orm::entity::prelude::*;

/// A 1:1 pairing of two channels for relayed chat. Rows are retained after
/// the call ends until the retention job purges them; `reported` pins a row
/// against retention while a moderation report is open.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "call")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub status: String,
    pub reported: bool,
    pub created_at: DateTimeUtc,
    pub ended_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::call_participant::Entity")]
    CallParticipant,
    #[sea_orm(has_many = "super::call_message::Entity")]
    CallMessage,
}

impl Related<super::call_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CallParticipant.def()
    }
}

impl Related<super::call_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CallMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
