use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

use crate::factory::helpers::next_id;

/// Creates an ongoing call between two channels, each with one initial user.
pub async fn create_ongoing_call(
    db: &DatabaseConnection,
    channel_a: u64,
    channel_b: u64,
) -> Result<entity::call::Model, DbErr> {
    let call = entity::call::ActiveModel {
        id: ActiveValue::Set(format!("call-{}", next_id())),
        status: ActiveValue::Set("ONGOING".to_string()),
        reported: ActiveValue::Set(false),
        created_at: ActiveValue::Set(Utc::now()),
        ended_at: ActiveValue::Set(None),
    }
    .insert(db)
    .await?;

    for channel_id in [channel_a, channel_b] {
        entity::call_participant::ActiveModel {
            call_id: ActiveValue::Set(call.id.clone()),
            channel_id: ActiveValue::Set(channel_id.to_string()),
            guild_id: ActiveValue::Set((channel_id * 10).to_string()),
            webhook_url: ActiveValue::Set(format!(
                "https://discord.com/api/webhooks/{channel_id}/test-token"
            )),
            users: ActiveValue::Set(serde_json::json!([channel_id * 100])),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(call)
}

/// Creates an ended call whose `ended_at` lies `ended_secs_ago` in the past.
pub async fn create_ended_call(
    db: &DatabaseConnection,
    ended_secs_ago: i64,
    reported: bool,
) -> Result<entity::call::Model, DbErr> {
    let ended_at = Utc::now() - Duration::seconds(ended_secs_ago);
    entity::call::ActiveModel {
        id: ActiveValue::Set(format!("call-{}", next_id())),
        status: ActiveValue::Set("ENDED".to_string()),
        reported: ActiveValue::Set(reported),
        created_at: ActiveValue::Set(ended_at - Duration::seconds(120)),
        ended_at: ActiveValue::Set(Some(ended_at)),
    }
    .insert(db)
    .await
}
