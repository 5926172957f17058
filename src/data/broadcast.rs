use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};

use crate::model::broadcast::{HubMessagePayload, ReactionMap};

/// Repository for hub messages and their broadcast mapping. The mapping
/// (`channel id -> remote message id` per original message) is the source of
/// truth for edit, delete, and reaction propagation.
pub struct HubMessageRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> HubMessageRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records the original message of a broadcast with an empty reaction map.
    pub async fn create_original(
        &self,
        hub_id: &str,
        payload: &HubMessagePayload,
    ) -> Result<entity::hub_message::Model, DbErr> {
        entity::hub_message::ActiveModel {
            id: ActiveValue::Set(payload.message_id.to_string()),
            hub_id: ActiveValue::Set(hub_id.to_string()),
            author_id: ActiveValue::Set(payload.author_id.to_string()),
            author_username: ActiveValue::Set(payload.author_username.clone()),
            channel_id: ActiveValue::Set(payload.channel_id.to_string()),
            guild_id: ActiveValue::Set(payload.guild_id.to_string()),
            content: ActiveValue::Set(payload.content.clone()),
            reactions: ActiveValue::Set(ReactionMap::new().to_value()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db)
        .await
    }

    /// Records one delivered copy of the original message.
    pub async fn add_copy(
        &self,
        hub_message_id: &str,
        channel_id: u64,
        message_id: u64,
    ) -> Result<entity::broadcast::Model, DbErr> {
        entity::broadcast::ActiveModel {
            hub_message_id: ActiveValue::Set(hub_message_id.to_string()),
            channel_id: ActiveValue::Set(channel_id.to_string()),
            message_id: ActiveValue::Set(message_id.to_string()),
            ..Default::default()
        }
        .insert(self.db)
        .await
    }

    /// All recorded copies of an original message.
    pub async fn copies(
        &self,
        hub_message_id: &str,
    ) -> Result<Vec<entity::broadcast::Model>, DbErr> {
        entity::prelude::Broadcast::find()
            .filter(entity::broadcast::Column::HubMessageId.eq(hub_message_id))
            .all(self.db)
            .await
    }

    /// Resolves the original hub message from any message id in a broadcast
    /// set: the original's own id, or the id of one of its copies.
    pub async fn resolve_origin(
        &self,
        message_id: u64,
    ) -> Result<Option<entity::hub_message::Model>, DbErr> {
        let id = message_id.to_string();

        if let Some(original) = entity::prelude::HubMessage::find_by_id(&id).one(self.db).await? {
            return Ok(Some(original));
        }

        let Some(copy) = entity::prelude::Broadcast::find()
            .filter(entity::broadcast::Column::MessageId.eq(&id))
            .one(self.db)
            .await?
        else {
            return Ok(None);
        };

        entity::prelude::HubMessage::find_by_id(&copy.hub_message_id)
            .one(self.db)
            .await
    }

    pub async fn update_content(&self, hub_message_id: &str, content: &str) -> Result<(), DbErr> {
        let Some(existing) = entity::prelude::HubMessage::find_by_id(hub_message_id)
            .one(self.db)
            .await?
        else {
            return Ok(());
        };

        let mut active: entity::hub_message::ActiveModel = existing.into();
        active.content = ActiveValue::Set(content.to_string());
        active.update(self.db).await?;
        Ok(())
    }

    pub async fn update_reactions(
        &self,
        hub_message_id: &str,
        reactions: &ReactionMap,
    ) -> Result<(), DbErr> {
        let Some(existing) = entity::prelude::HubMessage::find_by_id(hub_message_id)
            .one(self.db)
            .await?
        else {
            return Ok(());
        };

        let mut active: entity::hub_message::ActiveModel = existing.into();
        active.reactions = ActiveValue::Set(reactions.to_value());
        active.update(self.db).await?;
        Ok(())
    }

    /// Deletes the original row; broadcast copies cascade with it.
    pub async fn delete_original(&self, hub_message_id: &str) -> Result<u64, DbErr> {
        let result = entity::prelude::HubMessage::delete_by_id(hub_message_id)
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
