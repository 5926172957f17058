//! Hub broadcast pipeline.
//!
//! Fans a message out to every connected channel of a hub, records the
//! `channel id -> remote message id` mapping, and propagates edits and
//! deletions across the recorded copies. Partial fan-out is tolerated by
//! construction: a copy that failed to deliver simply has no mapping row
//! and is skipped during propagation. A webhook that reports itself gone
//! deactivates its connection so the hub heals itself.

pub mod reactions;

#[cfg(test)]
mod test;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serenity::all::CreateEmbed;
use tracing::{error, info, warn};

use crate::data::{ConnectionRepository, HubMessageRepository, HubRepository};
use crate::error::AppError;
use crate::gateway::{WebhookGateway, WebhookPayload, WebhookTarget};
use crate::model::broadcast::{BroadcastReport, HubMessagePayload};

pub struct BroadcastService {
    db: DatabaseConnection,
    gateway: Arc<dyn WebhookGateway>,
}

impl BroadcastService {
    pub fn new(db: DatabaseConnection, gateway: Arc<dyn WebhookGateway>) -> Self {
        Self { db, gateway }
    }

    /// Delivers a hub message to every connected channel except its origin.
    ///
    /// Each successful delivery is recorded as a broadcast row. A
    /// webhook-gone failure marks that connection disconnected and the
    /// fan-out continues; other failures are logged and skipped.
    pub async fn send_to_hub(
        &self,
        hub_id: &str,
        payload: &HubMessagePayload,
    ) -> Result<BroadcastReport, AppError> {
        let connection_repo = ConnectionRepository::new(&self.db);
        let message_repo = HubMessageRepository::new(&self.db);

        let origin_channel = payload.channel_id.to_string();
        let recipients: Vec<entity::connection::Model> = connection_repo
            .get_connected_by_hub(hub_id)
            .await?
            .into_iter()
            .filter(|conn| conn.channel_id != origin_channel)
            .collect();

        let original = message_repo.create_original(hub_id, payload).await?;

        let mut report = BroadcastReport::default();
        for conn in recipients {
            let channel_id = parse_snowflake(&conn.channel_id, "channel ID")?;
            let target = connection_target(&conn)?;

            let mut delivery = WebhookPayload::text(&payload.content)
                .with_author(&payload.author_username, payload.author_avatar_url.clone());
            if let Some(url) = &payload.attachment_url {
                delivery = delivery.with_embed(CreateEmbed::new().image(url));
            }

            match self.gateway.execute(&target, delivery).await {
                Ok(sent) => {
                    message_repo
                        .add_copy(&original.id, channel_id, sent.id)
                        .await?;
                    report.delivered += 1;
                }
                Err(e) if e.is_webhook_gone() => {
                    warn!(channel_id, "webhook gone, disconnecting channel from hub");
                    if let Err(db_err) = connection_repo.set_connected(channel_id, false).await {
                        error!("failed to mark connection disconnected: {db_err}");
                    }
                    report.disconnected.push(channel_id);
                }
                Err(e) => {
                    warn!(channel_id, "broadcast delivery failed: {e}");
                    report.failed += 1;
                }
            }
        }

        info!(
            hub_id,
            delivered = report.delivered,
            failed = report.failed,
            disconnected = report.disconnected.len(),
            "hub message broadcast"
        );
        Ok(report)
    }

    /// Applies an edit of the original message to every recorded copy.
    /// Returns the number of copies edited. Unknown messages return 0.
    pub async fn propagate_edit(
        &self,
        message_id: u64,
        new_content: &str,
    ) -> Result<usize, AppError> {
        let message_repo = HubMessageRepository::new(&self.db);
        let Some(original) = message_repo.resolve_origin(message_id).await? else {
            return Ok(0);
        };

        message_repo.update_content(&original.id, new_content).await?;

        let connection_repo = ConnectionRepository::new(&self.db);
        let mut edited = 0;
        for copy in message_repo.copies(&original.id).await? {
            let channel_id = parse_snowflake(&copy.channel_id, "channel ID")?;
            let Some(conn) = connection_repo.find_by_channel(channel_id).await? else {
                continue;
            };
            let target = connection_target(&conn)?;
            let copy_message_id = parse_snowflake(&copy.message_id, "message ID")?;

            match self
                .gateway
                .edit_message(&target, copy_message_id, WebhookPayload::text(new_content))
                .await
            {
                Ok(()) => edited += 1,
                Err(e) => warn!(channel_id, "skipping copy during edit propagation: {e}"),
            }
        }
        Ok(edited)
    }

    /// Propagates a deletion to every recorded copy, attributes the deletion
    /// via the audit-log heuristic, emits a mod-log entry when the hub has a
    /// log channel, and drops the broadcast mapping.
    ///
    /// `event_guild_id`/`event_channel_id` locate where the deletion event
    /// fired (original or copy); they default to the origin.
    pub async fn propagate_delete(
        &self,
        message_id: u64,
        event_guild_id: Option<u64>,
        event_channel_id: Option<u64>,
    ) -> Result<usize, AppError> {
        let message_repo = HubMessageRepository::new(&self.db);
        let Some(original) = message_repo.resolve_origin(message_id).await? else {
            return Ok(0);
        };

        let connection_repo = ConnectionRepository::new(&self.db);
        let mut deleted = 0;
        for copy in message_repo.copies(&original.id).await? {
            // The copy the event fired on is already gone.
            if copy.message_id == message_id.to_string() {
                continue;
            }
            let channel_id = parse_snowflake(&copy.channel_id, "channel ID")?;
            let Some(conn) = connection_repo.find_by_channel(channel_id).await? else {
                continue;
            };
            let target = connection_target(&conn)?;
            let copy_message_id = parse_snowflake(&copy.message_id, "message ID")?;

            match self.gateway.delete_message(&target, copy_message_id).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!(channel_id, "skipping copy during delete propagation: {e}"),
            }
        }

        let audit_guild = match event_guild_id {
            Some(id) => id,
            None => parse_snowflake(&original.guild_id, "guild ID")?,
        };
        let audit_channel = match event_channel_id {
            Some(id) => id,
            None => parse_snowflake(&original.channel_id, "channel ID")?,
        };
        let deleter = self.gateway.resolve_deleter(audit_guild, audit_channel).await;

        self.emit_mod_log(&original, deleter, deleted).await?;

        message_repo.delete_original(&original.id).await?;
        Ok(deleted)
    }

    /// Writes the deletion to the hub's mod-log channel, when configured.
    /// A deleter distinct from the author is named; otherwise the author is
    /// assumed to have removed their own message.
    async fn emit_mod_log(
        &self,
        original: &entity::hub_message::Model,
        deleter: Option<u64>,
        withdrawn: usize,
    ) -> Result<(), AppError> {
        let Some(hub) = HubRepository::new(&self.db).get_by_id(&original.hub_id).await? else {
            return Ok(());
        };
        let Some(log_channel) = &hub.mod_log_channel_id else {
            return Ok(());
        };
        let log_channel = parse_snowflake(log_channel, "channel ID")?;

        let line = match deleter {
            Some(moderator) if moderator.to_string() != original.author_id => format!(
                "🗑️ Message `{}` by **{}** was removed by <@{}>; withdrawn from {} channels.",
                original.id, original.author_username, moderator, withdrawn
            ),
            _ => format!(
                "🗑️ **{}** deleted their message `{}`; withdrawn from {} channels.",
                original.author_username, original.id, withdrawn
            ),
        };

        if let Err(e) = self.gateway.send_to_channel(log_channel, line).await {
            warn!(hub_id = %hub.id, "failed to write mod log entry: {e}");
        }
        Ok(())
    }
}

/// Delivery target for a connection. Thread connections execute the parent
/// channel's webhook against the thread.
fn connection_target(conn: &entity::connection::Model) -> Result<WebhookTarget, AppError> {
    let channel_id = parse_snowflake(&conn.channel_id, "channel ID")?;
    Ok(if conn.parent_channel_id.is_some() {
        WebhookTarget::thread(conn.webhook_url.clone(), channel_id)
    } else {
        WebhookTarget::channel(conn.webhook_url.clone())
    })
}

fn parse_snowflake(raw: &str, what: &str) -> Result<u64, AppError> {
    raw.parse::<u64>()
        .map_err(|e| AppError::InternalError(format!("Invalid {what}: {e}")))
}
