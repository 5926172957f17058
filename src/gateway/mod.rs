//! Webhook/channel gateway: the seam between the relay engine and Discord.
//!
//! Everything the pipelines know about delivery goes through
//! [`WebhookGateway`]; the serenity-backed implementation lives in
//! [`discord`], and [`mock`] provides a recording double for tests.

pub mod discord;
pub mod mock;

use async_trait::async_trait;
use serenity::all::{CreateActionRow, CreateEmbed};
use thiserror::Error;

/// Discord JSON error codes that mean the webhook (or its channel) is gone
/// for good. Deliveries failing with one of these should deactivate the
/// connection rather than retry.
const WEBHOOK_GONE_CODES: &[isize] = &[
    10003, // Unknown Channel
    10015, // Unknown Webhook
    50027, // Invalid Webhook Token
];

/// Unknown Message: the individual copy is gone, the webhook itself is fine.
const UNKNOWN_MESSAGE_CODE: isize = 10008;

/// Delivery errors, classified by how callers should react: `WebhookGone`
/// deactivates the connection, `MessageGone` skips the single copy, the
/// rest are transient.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("webhook no longer exists")]
    WebhookGone,

    #[error("message no longer exists")]
    MessageGone,

    #[error("webhook URL could not be parsed")]
    InvalidWebhookUrl,

    /// Boxed due to large size, matching how the rest of the crate carries
    /// serenity errors.
    #[error(transparent)]
    Discord(Box<serenity::Error>),
}

impl From<serenity::Error> for GatewayError {
    fn from(err: serenity::Error) -> Self {
        if let serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(response)) =
            &err
        {
            let code = response.error.code;
            if WEBHOOK_GONE_CODES.contains(&code) {
                return GatewayError::WebhookGone;
            }
            if code == UNKNOWN_MESSAGE_CODE {
                return GatewayError::MessageGone;
            }
        }
        if matches!(err, serenity::Error::Url(_)) {
            return GatewayError::InvalidWebhookUrl;
        }
        GatewayError::Discord(Box::new(err))
    }
}

impl GatewayError {
    /// Whether the target webhook should be considered dead.
    pub fn is_webhook_gone(&self) -> bool {
        matches!(self, GatewayError::WebhookGone)
    }
}

/// Where to deliver: a webhook URL, optionally scoped to a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub url: String,
    pub thread_id: Option<u64>,
}

impl WebhookTarget {
    pub fn channel(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            thread_id: None,
        }
    }

    pub fn thread(url: impl Into<String>, thread_id: u64) -> Self {
        Self {
            url: url.into(),
            thread_id: Some(thread_id),
        }
    }
}

/// What to deliver. Fields left empty are omitted from the request, which
/// for edits means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct WebhookPayload {
    pub content: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub embeds: Vec<CreateEmbed>,
    pub components: Option<Vec<CreateActionRow>>,
}

impl WebhookPayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: CreateEmbed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    pub fn with_author(mut self, username: impl Into<String>, avatar_url: Option<String>) -> Self {
        self.username = Some(username.into());
        self.avatar_url = avatar_url;
        self
    }

    pub fn with_embed(mut self, embed: CreateEmbed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn components_only(components: Vec<CreateActionRow>) -> Self {
        Self {
            components: Some(components),
            ..Self::default()
        }
    }
}

/// A delivered webhook message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub id: u64,
    pub channel_id: u64,
}

/// Send/edit/fetch surface over per-channel webhook endpoints, plus the two
/// bot-token operations the pipelines need (mod-log posts and the audit-log
/// deleter heuristic).
#[async_trait]
pub trait WebhookGateway: Send + Sync {
    /// Executes the webhook and waits for the created message.
    async fn execute(
        &self,
        target: &WebhookTarget,
        payload: WebhookPayload,
    ) -> Result<SentMessage, GatewayError>;

    async fn edit_message(
        &self,
        target: &WebhookTarget,
        message_id: u64,
        payload: WebhookPayload,
    ) -> Result<(), GatewayError>;

    async fn delete_message(
        &self,
        target: &WebhookTarget,
        message_id: u64,
    ) -> Result<(), GatewayError>;

    /// Looks up a previously delivered webhook message. `None` when the
    /// message no longer exists.
    async fn fetch_message(
        &self,
        target: &WebhookTarget,
        message_id: u64,
    ) -> Result<Option<SentMessage>, GatewayError>;

    /// Posts a plain message to a channel with the bot token (moderation
    /// log entries).
    async fn send_to_channel(&self, channel_id: u64, content: String)
        -> Result<(), GatewayError>;

    /// Returns the URL of an existing bot-owned webhook on the channel, or
    /// creates one.
    async fn get_or_create_channel_webhook(&self, channel_id: u64)
        -> Result<String, GatewayError>;

    /// Best-effort audit-log lookup: the moderator who most recently deleted
    /// a message in `channel_id`, if the deletion is recent enough to
    /// attribute. `None` means the author presumably deleted it themselves.
    async fn resolve_deleter(&self, guild_id: u64, channel_id: u64) -> Option<u64>;
}
