use test_utils::factory;

use super::support::{harness, payload_from};
use crate::data::{ConnectionRepository, HubMessageRepository};

/// Tests the basic fan-out: a message from one connected channel reaches
/// every other connected channel, and each delivery is recorded in the
/// broadcast mapping.
#[tokio::test]
async fn message_fans_out_to_all_other_connections() {
    let h = harness().await;
    let (hub, conns) = factory::helpers::create_hub_with_connections(&h.db, 4)
        .await
        .unwrap();

    let payload = payload_from(&conns[0], 500_001);
    let report = h.service.send_to_hub(&hub.id, &payload).await.unwrap();

    assert_eq!(report.delivered, 3);
    assert_eq!(report.failed, 0);
    assert!(report.disconnected.is_empty());

    // The origin channel never receives its own copy.
    let urls = h.gateway.executed_urls();
    assert_eq!(urls.len(), 3);
    assert!(!urls.iter().any(|u| u == &conns[0].webhook_url));

    // One mapping row per delivered copy.
    let copies = HubMessageRepository::new(&h.db)
        .copies("500001")
        .await
        .unwrap();
    assert_eq!(copies.len(), 3);
}

/// Tests fan-out resilience: one dead webhook does not stop the others,
/// and its connection is marked disconnected.
#[tokio::test]
async fn dead_webhook_degrades_only_its_connection() {
    let h = harness().await;
    let (hub, conns) = factory::helpers::create_hub_with_connections(&h.db, 4)
        .await
        .unwrap();
    h.gateway.mark_gone(&conns[2].webhook_url);

    let payload = payload_from(&conns[0], 500_002);
    let report = h.service.send_to_hub(&hub.id, &payload).await.unwrap();

    assert_eq!(report.delivered, 2);
    let dead_channel: u64 = conns[2].channel_id.parse().unwrap();
    assert_eq!(report.disconnected, vec![dead_channel]);

    // Self-healing: the dead connection no longer participates.
    let row = ConnectionRepository::new(&h.db)
        .find_by_channel(dead_channel)
        .await
        .unwrap()
        .unwrap();
    assert!(!row.connected);

    let remaining = ConnectionRepository::new(&h.db)
        .get_connected_by_hub(&hub.id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 3);

    // Only the successful sends were recorded; propagation will simply
    // skip the missing copy.
    let copies = HubMessageRepository::new(&h.db)
        .copies("500002")
        .await
        .unwrap();
    assert_eq!(copies.len(), 2);
}

/// Tests that a hub with no other connected channels still records the
/// original without delivering anywhere.
#[tokio::test]
async fn lone_connection_broadcasts_to_nobody() {
    let h = harness().await;
    let (hub, conns) = factory::helpers::create_hub_with_connections(&h.db, 1)
        .await
        .unwrap();

    let payload = payload_from(&conns[0], 500_003);
    let report = h.service.send_to_hub(&hub.id, &payload).await.unwrap();

    assert_eq!(report.delivered, 0);
    assert!(h.gateway.executed_urls().is_empty());

    let original = HubMessageRepository::new(&h.db)
        .resolve_origin(500_003)
        .await
        .unwrap();
    assert!(original.is_some());
}
