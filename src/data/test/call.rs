use std::collections::HashSet;

use chrono::{Duration, Utc};
use test_utils::{builder::TestBuilder, factory};

use crate::data::call::CallRepository;
use crate::model::call::{ActiveCall, CallMessage, CallRequest, CallStatus};

fn request(channel_id: u64, guild_id: u64, initiator_id: u64) -> CallRequest {
    CallRequest::new(
        channel_id,
        guild_id,
        initiator_id,
        format!("https://discord.com/api/webhooks/{channel_id}/token"),
    )
}

/// Tests persisting a matched call and loading it back, including the
/// participant user sets.
#[tokio::test]
async fn create_and_load_round_trips_the_call() {
    let test = TestBuilder::new().with_call_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let repo = CallRepository::new(db);

    let mut call = ActiveCall::connect(&request(1, 10, 100), &request(2, 20, 200));
    if let Some(p) = call.participant_mut(1) {
        p.users.insert(101);
    }
    repo.create(&call).await.unwrap();

    let loaded = repo.load(&call.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, CallStatus::Ongoing);
    assert_eq!(loaded.participants.len(), 2);
    assert_eq!(
        loaded.participant(1).map(|p| p.users.clone()),
        Some(HashSet::from([100, 101]))
    );
    assert_eq!(loaded.participant(2).map(|p| p.users.clone()), Some(HashSet::from([200])));
    assert!(loaded.messages.is_empty());
}

/// Tests the cache-miss lookup: only ongoing calls are found, and only by
/// their own participant channels.
#[tokio::test]
async fn find_ongoing_by_channel_ignores_ended_calls() {
    let test = TestBuilder::new().with_call_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let repo = CallRepository::new(db);

    let call = ActiveCall::connect(&request(1, 10, 100), &request(2, 20, 200));
    repo.create(&call).await.unwrap();

    assert_eq!(
        repo.find_ongoing_by_channel(1).await.unwrap().map(|c| c.id),
        Some(call.id.clone())
    );
    assert_eq!(
        repo.find_ongoing_by_channel(2).await.unwrap().map(|c| c.id),
        Some(call.id.clone())
    );
    assert!(repo.find_ongoing_by_channel(3).await.unwrap().is_none());

    assert!(repo.end(&call.id, Utc::now()).await.unwrap());
    assert!(repo.find_ongoing_by_channel(1).await.unwrap().is_none());
}

/// Tests the append-only message log and its ordering.
#[tokio::test]
async fn messages_append_in_order() {
    let test = TestBuilder::new().with_call_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let repo = CallRepository::new(db);

    let call = ActiveCall::connect(&request(1, 10, 100), &request(2, 20, 200));
    repo.create(&call).await.unwrap();

    for (i, content) in ["first", "second", "third"].iter().enumerate() {
        repo.append_message(
            &call.id,
            &CallMessage {
                author_id: 100,
                author_username: "alice".to_string(),
                content: content.to_string(),
                attachment_url: (i == 2).then(|| "https://cdn.example/file.png".to_string()),
                timestamp: Utc::now(),
            },
        )
        .await
        .unwrap();
    }

    let loaded = repo.load(&call.id).await.unwrap().unwrap();
    let contents: Vec<&str> = loaded.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
    assert_eq!(
        loaded.messages[2].attachment_url.as_deref(),
        Some("https://cdn.example/file.png")
    );
}

/// Tests replacing a participant's user set.
#[tokio::test]
async fn participant_users_can_be_replaced() {
    let test = TestBuilder::new().with_call_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let repo = CallRepository::new(db);

    let call = ActiveCall::connect(&request(1, 10, 100), &request(2, 20, 200));
    repo.create(&call).await.unwrap();

    let users = HashSet::from([100, 150, 175]);
    repo.set_participant_users(&call.id, 1, &users).await.unwrap();

    let loaded = repo.load(&call.id).await.unwrap().unwrap();
    assert_eq!(loaded.participant(1).map(|p| p.users.clone()), Some(users));
}

/// Tests the retention policy: old ended calls are purged with their
/// children, while reported, recent, and ongoing calls survive.
#[tokio::test]
async fn retention_purges_only_old_unreported_ended_calls() {
    let test = TestBuilder::new().with_call_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let repo = CallRepository::new(db);

    let old = factory::call::create_ended_call(db, 3600, false).await.unwrap();
    let reported = factory::call::create_ended_call(db, 3600, true).await.unwrap();
    let recent = factory::call::create_ended_call(db, 60, false).await.unwrap();
    let ongoing = factory::call::create_ongoing_call(db, 1, 2).await.unwrap();

    let cutoff = Utc::now() - Duration::seconds(1800);
    let purged = repo.purge_ended_before(cutoff).await.unwrap();

    assert_eq!(purged, 1);
    assert!(repo.load(&old.id).await.unwrap().is_none());
    assert!(repo.load(&reported.id).await.unwrap().is_some(), "reported calls are pinned");
    assert!(repo.load(&recent.id).await.unwrap().is_some());
    assert!(repo.load(&ongoing.id).await.unwrap().is_some());
}

/// Tests that deleting a call cascades to participants and messages.
#[tokio::test]
async fn delete_cascades_to_children() {
    let test = TestBuilder::new().with_call_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let repo = CallRepository::new(db);

    let call = ActiveCall::connect(&request(1, 10, 100), &request(2, 20, 200));
    repo.create(&call).await.unwrap();
    repo.append_message(
        &call.id,
        &CallMessage {
            author_id: 100,
            author_username: "alice".to_string(),
            content: "hello".to_string(),
            attachment_url: None,
            timestamp: Utc::now(),
        },
    )
    .await
    .unwrap();

    assert_eq!(repo.delete(&call.id).await.unwrap(), 1);
    assert!(repo.load(&call.id).await.unwrap().is_none());
    assert!(repo.find_ongoing_by_channel(1).await.unwrap().is_none());
}

/// Tests the moderation pin flag round trip.
#[tokio::test]
async fn set_reported_marks_the_row() {
    let test = TestBuilder::new().with_call_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();
    let repo = CallRepository::new(db);

    let call = factory::call::create_ended_call(db, 3600, false).await.unwrap();
    assert!(repo.set_reported(&call.id, true).await.unwrap());

    let purged = repo
        .purge_ended_before(Utc::now() - Duration::seconds(1800))
        .await
        .unwrap();
    assert_eq!(purged, 0, "the freshly reported call is pinned");

    assert!(!repo.set_reported("missing", true).await.unwrap());
}
