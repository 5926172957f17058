//! Shared harness for broadcast-pipeline tests.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use test_utils::builder::TestBuilder;

use crate::cache::memory::MemoryCache;
use crate::gateway::mock::MockGateway;
use crate::model::broadcast::HubMessagePayload;
use crate::service::broadcast::reactions::ReactionService;
use crate::service::broadcast::BroadcastService;

pub struct BroadcastHarness {
    pub db: DatabaseConnection,
    pub gateway: Arc<MockGateway>,
    pub service: BroadcastService,
    pub reactions: ReactionService,
}

pub async fn harness() -> BroadcastHarness {
    let test = TestBuilder::new().with_hub_tables().build().await.unwrap();
    let db = test.db.unwrap();

    let gateway = Arc::new(MockGateway::new());
    let cache = Arc::new(MemoryCache::default());
    let service = BroadcastService::new(db.clone(), gateway.clone());
    let reactions = ReactionService::new(
        db.clone(),
        gateway.clone(),
        cache,
        Duration::from_secs(5),
    );

    BroadcastHarness {
        db,
        gateway,
        service,
        reactions,
    }
}

/// A hub message originating from the given connection's channel.
pub fn payload_from(conn: &entity::connection::Model, message_id: u64) -> HubMessagePayload {
    HubMessagePayload {
        message_id,
        channel_id: conn.channel_id.parse().unwrap(),
        guild_id: conn.guild_id.parse().unwrap(),
        author_id: 42,
        author_username: "alice".to_string(),
        author_avatar_url: None,
        content: "hello hub".to_string(),
        attachment_url: None,
    }
}
