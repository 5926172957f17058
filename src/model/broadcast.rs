//! Broadcast domain types: the payload fanned out to hub connections and the
//! aggregated reaction map shared by every copy of a message.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Discord caps message components well below this, but the reaction map
/// itself stops accepting new emoji at the platform's 25-reaction limit.
pub const MAX_REACTION_EMOJIS: usize = 25;

/// A message entering a hub, as captured from the origin channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubMessagePayload {
    pub message_id: u64,
    pub channel_id: u64,
    pub guild_id: u64,
    pub author_id: u64,
    pub author_username: String,
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub attachment_url: Option<String>,
}

/// Outcome of a hub fan-out. Partial failure is expected and tolerated;
/// copies that could not be delivered are simply absent from the broadcast
/// mapping and skipped during propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
    /// Channels whose webhook turned out to be gone; their connections have
    /// been marked disconnected.
    pub disconnected: Vec<u64>,
}

/// Result of applying one reaction event to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    Added,
    Removed,
    /// The user already reacted with this emoji (adds are idempotent).
    AlreadyPresent,
    /// The user had no reaction with this emoji to remove.
    NotPresent,
    /// A new emoji was rejected because the message already carries the
    /// maximum number of distinct emoji.
    EmojiCapReached,
}

/// Aggregated reactions for one original message: emoji to the ordered list
/// of users who reacted with it. A user appears at most once per emoji.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionMap {
    entries: BTreeMap<String, Vec<u64>>,
}

impl ReactionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the persisted JSON column; malformed data yields an empty map.
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    /// Adds `user_id` under `emoji`.
    ///
    /// Idempotent per (user, emoji). New emoji are rejected once the map
    /// holds [`MAX_REACTION_EMOJIS`] distinct entries; existing emoji keep
    /// accepting reactors past the cap.
    pub fn add(&mut self, emoji: &str, user_id: u64) -> ReactionChange {
        if let Some(users) = self.entries.get_mut(emoji) {
            if users.contains(&user_id) {
                return ReactionChange::AlreadyPresent;
            }
            users.push(user_id);
            return ReactionChange::Added;
        }
        if self.entries.len() >= MAX_REACTION_EMOJIS {
            return ReactionChange::EmojiCapReached;
        }
        self.entries.insert(emoji.to_string(), vec![user_id]);
        ReactionChange::Added
    }

    /// Removes `user_id`'s reaction under `emoji`; drops the emoji entry
    /// when its last reactor leaves.
    pub fn remove(&mut self, emoji: &str, user_id: u64) -> ReactionChange {
        let Some(users) = self.entries.get_mut(emoji) else {
            return ReactionChange::NotPresent;
        };
        let Some(index) = users.iter().position(|id| *id == user_id) else {
            return ReactionChange::NotPresent;
        };
        users.remove(index);
        if users.is_empty() {
            self.entries.remove(emoji);
        }
        ReactionChange::Removed
    }

    pub fn reactors(&self, emoji: &str) -> Option<&[u64]> {
        self.entries.get(emoji).map(|users| users.as_slice())
    }

    /// The emoji with the most reactors (ties resolve to the
    /// lexicographically first emoji).
    pub fn top(&self) -> Option<(&str, usize)> {
        self.entries
            .iter()
            .max_by(|(a_emoji, a_users), (b_emoji, b_users)| {
                a_users
                    .len()
                    .cmp(&b_users.len())
                    .then_with(|| b_emoji.cmp(a_emoji))
            })
            .map(|(emoji, users)| (emoji.as_str(), users.len()))
    }

    pub fn distinct_emojis(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
