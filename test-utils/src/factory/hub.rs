use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

use crate::factory::helpers::next_id;

/// Creates a hub with a unique id and no mod-log channel.
pub async fn create_hub(db: &DatabaseConnection) -> Result<entity::hub::Model, DbErr> {
    let n = next_id();
    entity::hub::ActiveModel {
        id: ActiveValue::Set(format!("hub-{n}")),
        name: ActiveValue::Set(format!("Test Hub {n}")),
        mod_log_channel_id: ActiveValue::Set(None),
        created_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await
}

/// Creates a hub whose deletions are logged to `mod_log_channel_id`.
pub async fn create_hub_with_mod_log(
    db: &DatabaseConnection,
    mod_log_channel_id: u64,
) -> Result<entity::hub::Model, DbErr> {
    let n = next_id();
    entity::hub::ActiveModel {
        id: ActiveValue::Set(format!("hub-{n}")),
        name: ActiveValue::Set(format!("Test Hub {n}")),
        mod_log_channel_id: ActiveValue::Set(Some(mod_log_channel_id.to_string())),
        created_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await
}
