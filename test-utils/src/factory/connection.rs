use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Creates a connected channel in the given hub.
pub async fn create_connection(
    db: &DatabaseConnection,
    hub_id: &str,
    channel_id: u64,
    guild_id: u64,
) -> Result<entity::connection::Model, DbErr> {
    entity::connection::ActiveModel {
        hub_id: ActiveValue::Set(hub_id.to_string()),
        channel_id: ActiveValue::Set(channel_id.to_string()),
        guild_id: ActiveValue::Set(guild_id.to_string()),
        webhook_url: ActiveValue::Set(format!(
            "https://discord.com/api/webhooks/{channel_id}/test-token"
        )),
        parent_channel_id: ActiveValue::Set(None),
        connected: ActiveValue::Set(true),
        created_at: ActiveValue::Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}
