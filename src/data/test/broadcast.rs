use test_utils::{builder::TestBuilder, factory};

use crate::data::broadcast::HubMessageRepository;
use crate::model::broadcast::{HubMessagePayload, ReactionMap};

fn payload(message_id: u64) -> HubMessagePayload {
    HubMessagePayload {
        message_id,
        channel_id: 100,
        guild_id: 200,
        author_id: 300,
        author_username: "alice".to_string(),
        author_avatar_url: None,
        content: "original content".to_string(),
        attachment_url: None,
    }
}

/// Tests recording an original with its copies and reading the mapping
/// back.
#[tokio::test]
async fn records_original_and_copies() {
    let test = TestBuilder::new().with_hub_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let hub = factory::hub::create_hub(db).await.unwrap();

    let repo = HubMessageRepository::new(db);
    let original = repo.create_original(&hub.id, &payload(1000)).await.unwrap();
    assert_eq!(original.id, "1000");

    repo.add_copy("1000", 111, 2001).await.unwrap();
    repo.add_copy("1000", 222, 2002).await.unwrap();

    let copies = repo.copies("1000").await.unwrap();
    assert_eq!(copies.len(), 2);
    let pairs: Vec<(String, String)> = copies
        .iter()
        .map(|c| (c.channel_id.clone(), c.message_id.clone()))
        .collect();
    assert!(pairs.contains(&("111".to_string(), "2001".to_string())));
    assert!(pairs.contains(&("222".to_string(), "2002".to_string())));
}

/// Tests origin resolution from the original id and from any copy id.
#[tokio::test]
async fn resolves_origin_from_any_member_of_the_set() {
    let test = TestBuilder::new().with_hub_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let hub = factory::hub::create_hub(db).await.unwrap();

    let repo = HubMessageRepository::new(db);
    repo.create_original(&hub.id, &payload(1000)).await.unwrap();
    repo.add_copy("1000", 111, 2001).await.unwrap();

    let by_original = repo.resolve_origin(1000).await.unwrap();
    assert_eq!(by_original.map(|m| m.id), Some("1000".to_string()));

    let by_copy = repo.resolve_origin(2001).await.unwrap();
    assert_eq!(by_copy.map(|m| m.id), Some("1000".to_string()));

    assert!(repo.resolve_origin(9999).await.unwrap().is_none());
}

/// Tests the reaction JSON column round trip through the repository.
#[tokio::test]
async fn reaction_map_round_trips_through_the_row() {
    let test = TestBuilder::new().with_hub_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let hub = factory::hub::create_hub(db).await.unwrap();

    let repo = HubMessageRepository::new(db);
    repo.create_original(&hub.id, &payload(1000)).await.unwrap();

    let mut map = ReactionMap::new();
    map.add("👍", 1);
    map.add("👍", 2);
    map.add("🎉", 3);
    repo.update_reactions("1000", &map).await.unwrap();

    let stored = repo.resolve_origin(1000).await.unwrap().unwrap();
    assert_eq!(ReactionMap::from_value(&stored.reactions), map);
}

/// Tests content updates on the original row.
#[tokio::test]
async fn updates_content_in_place() {
    let test = TestBuilder::new().with_hub_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let hub = factory::hub::create_hub(db).await.unwrap();

    let repo = HubMessageRepository::new(db);
    repo.create_original(&hub.id, &payload(1000)).await.unwrap();

    repo.update_content("1000", "edited").await.unwrap();

    let stored = repo.resolve_origin(1000).await.unwrap().unwrap();
    assert_eq!(stored.content, "edited");
}

/// Tests that deleting the original cascades to its copies.
#[tokio::test]
async fn delete_original_cascades_to_copies() {
    let test = TestBuilder::new().with_hub_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let hub = factory::hub::create_hub(db).await.unwrap();

    let repo = HubMessageRepository::new(db);
    repo.create_original(&hub.id, &payload(1000)).await.unwrap();
    repo.add_copy("1000", 111, 2001).await.unwrap();
    repo.add_copy("1000", 222, 2002).await.unwrap();

    let deleted = repo.delete_original("1000").await.unwrap();
    assert_eq!(deleted, 1);

    assert!(repo.resolve_origin(1000).await.unwrap().is_none());
    assert!(repo.copies("1000").await.unwrap().is_empty());
    assert!(repo.resolve_origin(2001).await.unwrap().is_none());
}
