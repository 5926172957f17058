use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};

use crate::model::hub::{NewConnection, NewHub};

pub struct HubRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> HubRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, params: NewHub) -> Result<entity::hub::Model, DbErr> {
        entity::hub::ActiveModel {
            id: ActiveValue::Set(params.id),
            name: ActiveValue::Set(params.name),
            mod_log_channel_id: ActiveValue::Set(
                params.mod_log_channel_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db)
        .await
    }

    pub async fn get_by_id(&self, hub_id: &str) -> Result<Option<entity::hub::Model>, DbErr> {
        entity::prelude::Hub::find_by_id(hub_id).one(self.db).await
    }
}

pub struct ConnectionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ConnectionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        params: NewConnection,
    ) -> Result<entity::connection::Model, DbErr> {
        entity::connection::ActiveModel {
            hub_id: ActiveValue::Set(params.hub_id),
            channel_id: ActiveValue::Set(params.channel_id.to_string()),
            guild_id: ActiveValue::Set(params.guild_id.to_string()),
            webhook_url: ActiveValue::Set(params.webhook_url),
            parent_channel_id: ActiveValue::Set(
                params.parent_channel_id.map(|id| id.to_string()),
            ),
            connected: ActiveValue::Set(true),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db)
        .await
    }

    /// All connections of a hub that are currently receiving broadcasts.
    pub async fn get_connected_by_hub(
        &self,
        hub_id: &str,
    ) -> Result<Vec<entity::connection::Model>, DbErr> {
        entity::prelude::Connection::find()
            .filter(entity::connection::Column::HubId.eq(hub_id))
            .filter(entity::connection::Column::Connected.eq(true))
            .all(self.db)
            .await
    }

    pub async fn find_by_channel(
        &self,
        channel_id: u64,
    ) -> Result<Option<entity::connection::Model>, DbErr> {
        entity::prelude::Connection::find()
            .filter(entity::connection::Column::ChannelId.eq(channel_id.to_string()))
            .one(self.db)
            .await
    }

    /// Flips the connected flag; used to self-heal hubs whose webhook was
    /// deleted externally. Returns whether a connection row was found.
    pub async fn set_connected(&self, channel_id: u64, connected: bool) -> Result<bool, DbErr> {
        let Some(existing) = self.find_by_channel(channel_id).await? else {
            return Ok(false);
        };

        let mut active: entity::connection::ActiveModel = existing.into();
        active.connected = ActiveValue::Set(connected);
        active.update(self.db).await?;
        Ok(true)
    }
}
