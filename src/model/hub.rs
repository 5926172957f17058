//! Parameter models for hub and connection rows.

/// Parameters for creating a hub.
#[derive(Debug, Clone)]
pub struct NewHub {
    pub id: String,
    pub name: String,
    pub mod_log_channel_id: Option<u64>,
}

/// Parameters for connecting a channel to a hub.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub hub_id: String,
    pub channel_id: u64,
    pub guild_id: u64,
    pub webhook_url: String,
    /// Present when the connection targets a thread; the webhook belongs to
    /// this parent channel.
    pub parent_channel_id: Option<u64>,
}
