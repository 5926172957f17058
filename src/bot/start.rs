use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serenity::all::{ActivityData, Context, EventHandler, GatewayIntents, Message, Ready};
use serenity::async_trait;
use serenity::model::channel::Reaction;
use serenity::model::event::MessageUpdateEvent;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use tracing::info;

use crate::service::broadcast::reactions::ReactionService;
use crate::service::broadcast::BroadcastService;
use crate::service::call::CallService;

/// Shared handles the event handlers route into.
pub struct BotContext {
    pub db: DatabaseConnection,
    pub calls: Arc<CallService>,
    pub broadcast: Arc<BroadcastService>,
    pub reactions: Arc<ReactionService>,
}

/// Discord bot event handler
pub struct Handler {
    app: Arc<BotContext>,
}

impl Handler {
    pub fn new(app: Arc<BotContext>) -> Self {
        Self { app }
    }

    /// Intents the relay needs; `MESSAGE_CONTENT` is privileged.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready and connected to Discord
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected to Discord!", ready.user.name);

        ctx.set_activity(Some(ActivityData::custom("Connecting servers")));
    }

    /// Called on every new message in a guild channel
    async fn message(&self, ctx: Context, message: Message) {
        super::handler::message::handle_message(&self.app, ctx, message).await;
    }

    /// Called when a message is edited
    async fn message_update(
        &self,
        _ctx: Context,
        _old_if_available: Option<Message>,
        _new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        super::handler::message::handle_message_update(&self.app, event).await;
    }

    /// Called when a message is deleted
    async fn message_delete(
        &self,
        _ctx: Context,
        channel_id: ChannelId,
        deleted_message_id: MessageId,
        guild_id: Option<GuildId>,
    ) {
        super::handler::message::handle_message_delete(
            &self.app,
            channel_id,
            deleted_message_id,
            guild_id,
        )
        .await;
    }

    /// Called when a reaction is added to a message
    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        super::handler::reaction::handle_reaction_add(&self.app, reaction).await;
    }

    /// Called when a reaction is removed from a message
    async fn reaction_remove(&self, _ctx: Context, reaction: Reaction) {
        super::handler::reaction::handle_reaction_remove(&self.app, reaction).await;
    }
}
