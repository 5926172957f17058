//! Call domain types: queued requests, active calls, participants, and the
//! derived status/statistics views.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pending request for a call partner.
///
/// Created when a channel enters the queue, immutable afterwards, and
/// consumed once matched or expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub id: String,
    pub channel_id: u64,
    pub guild_id: u64,
    pub initiator_id: u64,
    pub webhook_url: String,
    pub requested_at: DateTime<Utc>,
    /// Higher values are served first; ties fall back to enqueue time.
    pub priority: i32,
    pub cluster_id: Option<u32>,
}

impl CallRequest {
    pub fn new(
        channel_id: u64,
        guild_id: u64,
        initiator_id: u64,
        webhook_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channel_id,
            guild_id,
            initiator_id,
            webhook_url: webhook_url.into(),
            requested_at: Utc::now(),
            priority: 0,
            cluster_id: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_cluster(mut self, cluster_id: Option<u32>) -> Self {
        self.cluster_id = cluster_id;
        self
    }

    /// Whether the request has sat in the queue longer than `timeout`.
    pub fn is_expired(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.requested_at)
            .to_std()
            .map(|elapsed| elapsed >= timeout)
            .unwrap_or(false)
    }
}

/// Lifecycle status of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStatus {
    #[serde(rename = "ONGOING")]
    Ongoing,
    #[serde(rename = "ENDED")]
    Ended,
}

impl CallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ONGOING",
            Self::Ended => "ENDED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ONGOING" => Some(Self::Ongoing),
            "ENDED" => Some(Self::Ended),
            _ => None,
        }
    }
}

/// One side of a call.
///
/// `users` accumulates every distinct user that has sent a message from this
/// channel during the call. It only grows; the set is what gives reaction
/// and relay targeting its dedup guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallParticipant {
    pub channel_id: u64,
    pub guild_id: u64,
    pub webhook_url: String,
    pub users: HashSet<u64>,
}

impl CallParticipant {
    pub fn from_request(request: &CallRequest) -> Self {
        Self {
            channel_id: request.channel_id,
            guild_id: request.guild_id,
            webhook_url: request.webhook_url.clone(),
            users: HashSet::from([request.initiator_id]),
        }
    }
}

/// A message relayed through a call. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMessage {
    pub author_id: u64,
    pub author_username: String,
    pub content: String,
    pub attachment_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// An active (or just-ended) call with its two participants and message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCall {
    pub id: String,
    pub status: CallStatus,
    pub participants: Vec<CallParticipant>,
    pub messages: Vec<CallMessage>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ActiveCall {
    /// Creates an ongoing call joining two matched requests.
    pub fn connect(a: &CallRequest, b: &CallRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: CallStatus::Ongoing,
            participants: vec![
                CallParticipant::from_request(a),
                CallParticipant::from_request(b),
            ],
            messages: Vec::new(),
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn involves_channel(&self, channel_id: u64) -> bool {
        self.participants.iter().any(|p| p.channel_id == channel_id)
    }

    pub fn participant(&self, channel_id: u64) -> Option<&CallParticipant> {
        self.participants.iter().find(|p| p.channel_id == channel_id)
    }

    pub fn participant_mut(&mut self, channel_id: u64) -> Option<&mut CallParticipant> {
        self.participants
            .iter_mut()
            .find(|p| p.channel_id == channel_id)
    }

    /// The other side of the call, seen from `channel_id`.
    pub fn peer_of(&self, channel_id: u64) -> Option<&CallParticipant> {
        self.participants.iter().find(|p| p.channel_id != channel_id)
    }

    /// Summary statistics used in end-of-call notifications.
    pub fn stats(&self, now: DateTime<Utc>) -> CallStats {
        let end = self.ended_at.unwrap_or(now);
        let users: HashSet<u64> = self
            .participants
            .iter()
            .flat_map(|p| p.users.iter().copied())
            .collect();
        CallStats {
            duration_secs: end
                .signed_duration_since(self.created_at)
                .num_seconds()
                .max(0),
            message_count: self.messages.len(),
            user_count: users.len(),
        }
    }
}

/// End-of-call summary shown to both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    pub duration_secs: i64,
    pub message_count: usize,
    pub user_count: usize,
}

/// Position of a queued channel, computed on demand from the queue contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    /// 1-based position in service order.
    pub position: usize,
    pub queue_length: usize,
}

/// Result of a matching attempt for a single request.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Matched {
        call: ActiveCall,
        /// Time the newer of the two requests spent waiting.
        match_time_ms: i64,
    },
    Unmatched,
}

/// Snapshot of matching-engine counters, for observability only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingStats {
    pub enqueued_requests: u64,
    pub matched_pairs: u64,
    pub average_match_time_ms: f64,
    /// Fraction of enqueued requests that ended up matched.
    pub success_rate: f64,
    pub queue_length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn request(channel_id: u64, guild_id: u64, initiator_id: u64) -> CallRequest {
        CallRequest::new(
            channel_id,
            guild_id,
            initiator_id,
            format!("https://discord.com/api/webhooks/{channel_id}/token"),
        )
    }

    #[test]
    fn connect_builds_two_ongoing_participants() {
        let call = ActiveCall::connect(&request(1, 10, 100), &request(2, 20, 200));

        assert_eq!(call.status, CallStatus::Ongoing);
        assert_eq!(call.participants.len(), 2);
        assert!(call.involves_channel(1));
        assert!(call.involves_channel(2));
        assert_eq!(
            call.participant(1).map(|p| &p.users),
            Some(&HashSet::from([100]))
        );
    }

    #[test]
    fn peer_of_returns_the_other_side() {
        let call = ActiveCall::connect(&request(1, 10, 100), &request(2, 20, 200));

        assert_eq!(call.peer_of(1).map(|p| p.channel_id), Some(2));
        assert_eq!(call.peer_of(2).map(|p| p.channel_id), Some(1));
        assert!(call.peer_of(3).is_some(), "unknown channel sees either side");
    }

    #[test]
    fn serde_round_trip_preserves_user_sets() {
        let mut call = ActiveCall::connect(&request(1, 10, 100), &request(2, 20, 200));
        if let Some(p) = call.participant_mut(1) {
            p.users.insert(101);
            p.users.insert(102);
        }
        call.messages.push(CallMessage {
            author_id: 101,
            author_username: "someone".to_string(),
            content: "hello".to_string(),
            attachment_url: None,
            timestamp: Utc::now(),
        });

        let json = serde_json::to_string(&call).unwrap();
        let restored: ActiveCall = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, call);
        assert_eq!(
            restored.participant(1).map(|p| &p.users),
            Some(&HashSet::from([100, 101, 102]))
        );
    }

    #[test]
    fn status_string_round_trip() {
        assert_eq!(CallStatus::parse(CallStatus::Ongoing.as_str()), Some(CallStatus::Ongoing));
        assert_eq!(CallStatus::parse(CallStatus::Ended.as_str()), Some(CallStatus::Ended));
        assert_eq!(CallStatus::parse("bogus"), None);
    }

    #[test]
    fn request_expiry_uses_enqueue_time() {
        let mut req = request(1, 10, 100);
        let now = Utc::now();
        req.requested_at = now - ChronoDuration::seconds(301);

        assert!(req.is_expired(Duration::from_secs(300), now));
        assert!(!req.is_expired(Duration::from_secs(600), now));
    }

    #[test]
    fn stats_counts_distinct_users_across_sides() {
        let mut call = ActiveCall::connect(&request(1, 10, 100), &request(2, 20, 200));
        if let Some(p) = call.participant_mut(1) {
            p.users.insert(300);
        }
        if let Some(p) = call.participant_mut(2) {
            p.users.insert(300);
        }

        let stats = call.stats(Utc::now());
        assert_eq!(stats.user_count, 3, "shared id counted once");
        assert_eq!(stats.message_count, 0);
    }
}
