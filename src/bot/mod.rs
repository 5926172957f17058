//! Discord bot integration for the relay pipelines.
//!
//! The bot listens for message, edit, delete, and reaction events and routes
//! them into the call engine and the broadcast pipeline. Command parsing,
//! embeds for the command surface, and localization live in the separate
//! command layer; this module only wires gateway events to the services.
//!
//! # Gateway Intents
//!
//! - `GUILDS` - Guild availability events
//! - `GUILD_MESSAGES` - Message create/update/delete events
//! - `MESSAGE_CONTENT` - Message content for relaying (privileged intent)
//! - `GUILD_MESSAGE_REACTIONS` - Reaction add/remove events
//!
//! Note: `MESSAGE_CONTENT` is a privileged intent and must be explicitly
//! enabled in the Discord Developer Portal for the bot application.

pub mod handler;
pub mod start;
