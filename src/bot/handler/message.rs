use serenity::all::{Context, Message};
use serenity::model::event::MessageUpdateEvent;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use tracing::{debug, error};

use crate::bot::start::BotContext;
use crate::data::ConnectionRepository;
use crate::model::broadcast::HubMessagePayload;

/// Routes a new guild message: call relay first (a channel in a call never
/// broadcasts), then hub fan-out if the channel is connected.
pub async fn handle_message(app: &BotContext, _ctx: Context, message: Message) {
    // Webhook and bot traffic includes our own relayed copies.
    if message.author.bot {
        return;
    }
    let Some(guild_id) = message.guild_id else {
        return;
    };

    let channel_id = message.channel_id.get();

    match app.calls.get_active_call(channel_id).await {
        Ok(Some(_)) => {
            let attachment_url = message.attachments.first().map(|a| a.url.clone());
            if let Err(e) = app
                .calls
                .update_call_message(
                    channel_id,
                    message.author.id.get(),
                    &message.author.name,
                    &message.content,
                    attachment_url,
                )
                .await
            {
                error!("Failed to relay call message: {e}");
            }
            return;
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to check active call: {e}");
            return;
        }
    }

    let connection = match ConnectionRepository::new(&app.db)
        .find_by_channel(channel_id)
        .await
    {
        Ok(Some(conn)) if conn.connected => conn,
        Ok(_) => return, // Not a hub channel
        Err(e) => {
            error!("Failed to look up hub connection: {e}");
            return;
        }
    };

    let payload = HubMessagePayload {
        message_id: message.id.get(),
        channel_id,
        guild_id: guild_id.get(),
        author_id: message.author.id.get(),
        author_username: message.author.name.clone(),
        author_avatar_url: message.author.avatar_url(),
        content: message.content.clone(),
        attachment_url: message.attachments.first().map(|a| a.url.clone()),
    };

    match app.broadcast.send_to_hub(&connection.hub_id, &payload).await {
        Ok(report) => debug!(
            hub_id = %connection.hub_id,
            delivered = report.delivered,
            "message broadcast to hub"
        ),
        Err(e) => error!("Failed to broadcast hub message: {e}"),
    }
}

/// Propagates an edit of a broadcast original to all copies.
pub async fn handle_message_update(app: &BotContext, event: MessageUpdateEvent) {
    let Some(content) = event.content else {
        return; // Embed-only updates carry no content change
    };

    match app.broadcast.propagate_edit(event.id.get(), &content).await {
        Ok(0) => {}
        Ok(edited) => debug!(message_id = event.id.get(), edited, "edit propagated"),
        Err(e) => error!("Failed to propagate edit: {e}"),
    }
}

/// Propagates a deletion of any broadcast copy (or the original) to the
/// rest of the set.
pub async fn handle_message_delete(
    app: &BotContext,
    channel_id: ChannelId,
    deleted_message_id: MessageId,
    guild_id: Option<GuildId>,
) {
    match app
        .broadcast
        .propagate_delete(
            deleted_message_id.get(),
            guild_id.map(|id| id.get()),
            Some(channel_id.get()),
        )
        .await
    {
        Ok(0) => {}
        Ok(deleted) => debug!(
            message_id = deleted_message_id.get(),
            deleted, "deletion propagated"
        ),
        Err(e) => error!("Failed to propagate deletion: {e}"),
    }
}
