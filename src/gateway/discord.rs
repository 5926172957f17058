//! Serenity-backed gateway implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serenity::all::{
    ChannelId, CreateWebhook, EditWebhookMessage, ExecuteWebhook, GuildId, MessageId, Webhook,
};
use serenity::http::Http;
use serenity::model::guild::audit_log::{Action, MessageAction};

use crate::gateway::{
    GatewayError, SentMessage, WebhookGateway, WebhookPayload, WebhookTarget,
};

/// Name given to webhooks the bot creates for itself.
const WEBHOOK_NAME: &str = "InterChat";

/// Audit entries older than this are not attributed to a moderator.
const AUDIT_ATTRIBUTION_WINDOW_SECS: i64 = 10;

pub struct DiscordGateway {
    http: Arc<Http>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    async fn webhook(&self, target: &WebhookTarget) -> Result<Webhook, GatewayError> {
        Ok(Webhook::from_url(&self.http, &target.url).await?)
    }
}

#[async_trait]
impl WebhookGateway for DiscordGateway {
    async fn execute(
        &self,
        target: &WebhookTarget,
        payload: WebhookPayload,
    ) -> Result<SentMessage, GatewayError> {
        let webhook = self.webhook(target).await?;

        let mut builder = ExecuteWebhook::new();
        if let Some(content) = payload.content {
            builder = builder.content(content);
        }
        if let Some(username) = payload.username {
            builder = builder.username(username);
        }
        if let Some(avatar_url) = payload.avatar_url {
            builder = builder.avatar_url(avatar_url);
        }
        if !payload.embeds.is_empty() {
            builder = builder.embeds(payload.embeds);
        }
        if let Some(components) = payload.components {
            builder = builder.components(components);
        }
        if let Some(thread_id) = target.thread_id {
            builder = builder.in_thread(ChannelId::new(thread_id));
        }

        let message = webhook
            .execute(&self.http, true, builder)
            .await?
            .ok_or_else(|| {
                GatewayError::Discord(Box::new(serenity::Error::Other(
                    "webhook execution returned no message despite wait",
                )))
            })?;

        Ok(SentMessage {
            id: message.id.get(),
            channel_id: message.channel_id.get(),
        })
    }

    async fn edit_message(
        &self,
        target: &WebhookTarget,
        message_id: u64,
        payload: WebhookPayload,
    ) -> Result<(), GatewayError> {
        let webhook = self.webhook(target).await?;

        let mut builder = EditWebhookMessage::new();
        if let Some(content) = payload.content {
            builder = builder.content(content);
        }
        if !payload.embeds.is_empty() {
            builder = builder.embeds(payload.embeds);
        }
        if let Some(components) = payload.components {
            builder = builder.components(components);
        }
        if let Some(thread_id) = target.thread_id {
            builder = builder.in_thread(ChannelId::new(thread_id));
        }

        webhook
            .edit_message(&self.http, MessageId::new(message_id), builder)
            .await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        target: &WebhookTarget,
        message_id: u64,
    ) -> Result<(), GatewayError> {
        let webhook = self.webhook(target).await?;
        webhook
            .delete_message(
                &self.http,
                target.thread_id.map(ChannelId::new),
                MessageId::new(message_id),
            )
            .await?;
        Ok(())
    }

    async fn fetch_message(
        &self,
        target: &WebhookTarget,
        message_id: u64,
    ) -> Result<Option<SentMessage>, GatewayError> {
        let webhook = self.webhook(target).await?;
        let fetched = webhook
            .get_message(
                &self.http,
                target.thread_id.map(ChannelId::new),
                MessageId::new(message_id),
            )
            .await;

        match fetched {
            Ok(message) => Ok(Some(SentMessage {
                id: message.id.get(),
                channel_id: message.channel_id.get(),
            })),
            Err(e) => match GatewayError::from(e) {
                GatewayError::MessageGone => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn send_to_channel(
        &self,
        channel_id: u64,
        content: String,
    ) -> Result<(), GatewayError> {
        ChannelId::new(channel_id).say(&self.http, content).await?;
        Ok(())
    }

    async fn get_or_create_channel_webhook(
        &self,
        channel_id: u64,
    ) -> Result<String, GatewayError> {
        let channel = ChannelId::new(channel_id);

        let existing = channel.webhooks(&self.http).await?;
        for webhook in existing {
            let is_own = webhook
                .name
                .as_deref()
                .is_some_and(|name| name == WEBHOOK_NAME);
            if is_own && webhook.token.is_some() {
                return Ok(webhook.url()?);
            }
        }

        let created = channel
            .create_webhook(&self.http, CreateWebhook::new(WEBHOOK_NAME))
            .await?;
        Ok(created.url()?)
    }

    async fn resolve_deleter(&self, guild_id: u64, channel_id: u64) -> Option<u64> {
        let logs = self
            .http
            .get_audit_logs(
                GuildId::new(guild_id),
                Some(Action::Message(MessageAction::Delete)),
                None,
                None,
                Some(10),
            )
            .await
            .ok()?;

        let now = Utc::now();
        logs.entries.iter().find_map(|entry| {
            let options = entry.options.as_ref()?;
            if options.channel_id != Some(ChannelId::new(channel_id)) {
                return None;
            }
            let age = now.signed_duration_since(*entry.id.created_at());
            if age.num_seconds() > AUDIT_ATTRIBUTION_WINDOW_SECS {
                return None;
            }
            Some(entry.user_id.get())
        })
    }
}
