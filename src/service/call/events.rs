//! Lifecycle events flowing from the call engine to the notification
//! service.
//!
//! Using one enum keeps the notifier's rendering exhaustive: adding an
//! event variant forces a rendering decision at compile time instead of a
//! silently-dropped string topic.

use crate::model::call::CallStats;

/// Why a call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Hangup,
    Skip,
}

/// A lifecycle event delivered to call participants.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    /// A partner was found; the call is live.
    Matched { call_id: String },
    /// The call ended, with a summary of what happened.
    Ended { reason: EndReason, stats: CallStats },
    /// The queued request expired without finding a partner.
    Timeout,
    /// Relaying a message to the other side failed.
    ConnectionError { detail: String },
    /// Another user joined the conversation on one side.
    ParticipantJoined { username: String },
    /// A user left the conversation on one side.
    ParticipantLeft { username: String },
}

impl CallEvent {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Matched { .. } => "📞 Connected!",
            Self::Ended { .. } => "👋 Call ended",
            Self::Timeout => "⏳ No one picked up",
            Self::ConnectionError { .. } => "⚠️ Connection problem",
            Self::ParticipantJoined { .. } => "➕ Someone joined",
            Self::ParticipantLeft { .. } => "➖ Someone left",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Matched { .. } => {
                "You are now talking to another server. Say hi! Use /hangup to end the call or /skip to find someone else.".to_string()
            }
            Self::Ended { reason, stats } => {
                let how = match reason {
                    EndReason::Hangup => "The call was ended",
                    EndReason::Skip => "The other side skipped",
                };
                format!(
                    "{how} after {}s — {} messages from {} users.",
                    stats.duration_secs, stats.message_count, stats.user_count
                )
            }
            Self::Timeout => {
                "No partner could be found in time. Try calling again later.".to_string()
            }
            Self::ConnectionError { detail } => {
                format!("Your message could not be delivered: {detail}")
            }
            Self::ParticipantJoined { username } => {
                format!("**{username}** joined the conversation.")
            }
            Self::ParticipantLeft { username } => {
                format!("**{username}** left the conversation.")
            }
        }
    }

    /// Embed accent color, matching the severity of the event.
    pub fn color(&self) -> u32 {
        match self {
            Self::Matched { .. } => 0x2ecc71,
            Self::Ended { .. } => 0x3498db,
            Self::Timeout => 0xf39c12,
            Self::ConnectionError { .. } => 0xe74c3c,
            Self::ParticipantJoined { .. } | Self::ParticipantLeft { .. } => 0x95a5a6,
        }
    }
}
