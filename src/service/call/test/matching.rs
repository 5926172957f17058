use sea_orm::EntityTrait;

use super::support::{harness, request};
use crate::cache::CallCache;
use crate::model::call::MatchOutcome;

/// Tests end-to-end pairing by the background sweep: two queued channels
/// from different guilds become one call with two participants, and both
/// queue entries are consumed.
#[tokio::test]
async fn sweep_pairs_two_eligible_requests() {
    let h = harness().await;
    h.queue.enqueue(request(1, 10, 100)).await.unwrap();
    h.queue.enqueue(request(2, 20, 200)).await.unwrap();

    let matches = h.engine.sweep().await;

    assert_eq!(matches, 1);
    assert!(h.queue.is_empty().await);

    // Cache routes both channels to the same call.
    let via_a = h.cache.get_active_call(1).await.unwrap().unwrap();
    let via_b = h.cache.get_active_call(2).await.unwrap().unwrap();
    assert_eq!(via_a.id, via_b.id);
    assert_eq!(via_a.participants.len(), 2);

    // Pairing validity: distinct channels, distinct guilds.
    let guilds: Vec<u64> = via_a.participants.iter().map(|p| p.guild_id).collect();
    assert_ne!(guilds[0], guilds[1]);

    // The durable row exists and is ongoing.
    let stored = entity::prelude::Call::find_by_id(&via_a.id)
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "ONGOING");
}

/// Tests that two channels of the same guild are never paired.
#[tokio::test]
async fn same_guild_is_never_paired() {
    let h = harness().await;
    h.queue.enqueue(request(1, 10, 100)).await.unwrap();
    h.queue.enqueue(request(2, 10, 200)).await.unwrap();

    assert_eq!(h.engine.sweep().await, 0);
    assert_eq!(h.queue.len().await, 2);
}

/// Tests the recent-match exclusion: users who just talked are not paired
/// again inside the window.
#[tokio::test]
async fn recent_pair_is_excluded() {
    let h = harness().await;
    h.cache.record_recent_match(100, 200).await.unwrap();

    h.queue.enqueue(request(1, 10, 100)).await.unwrap();
    h.queue.enqueue(request(2, 20, 200)).await.unwrap();

    assert_eq!(h.engine.sweep().await, 0);
    assert_eq!(h.queue.len().await, 2, "both keep waiting");

    // A third, unrelated channel is still fair game for either.
    h.queue.enqueue(request(3, 30, 300)).await.unwrap();
    assert_eq!(h.engine.sweep().await, 1);
}

/// Tests immediate matching through `find_match` for a just-enqueued
/// request.
#[tokio::test]
async fn find_match_connects_against_a_waiting_request() {
    let h = harness().await;
    h.queue.enqueue(request(1, 10, 100)).await.unwrap();

    let incoming = request(2, 20, 200);
    h.queue.enqueue(incoming.clone()).await.unwrap();

    let outcome = h.engine.find_match(&incoming).await.unwrap();
    let MatchOutcome::Matched { call, .. } = outcome else {
        panic!("expected a match");
    };
    assert!(call.involves_channel(1));
    assert!(call.involves_channel(2));
    assert!(h.queue.is_empty().await);
}

/// Tests that a request cancelled between selection and commit aborts the
/// match benignly: the candidate stays queued and no call is created.
#[tokio::test]
async fn stale_request_aborts_without_side_effects() {
    let h = harness().await;
    h.queue.enqueue(request(1, 10, 100)).await.unwrap();

    // This request was never enqueued (e.g. cancelled right after the
    // snapshot was taken).
    let stale = request(2, 20, 200);

    let outcome = h.engine.find_match(&stale).await.unwrap();

    assert!(matches!(outcome, MatchOutcome::Unmatched));
    assert!(h.queue.is_queued(1).await, "survivor unaffected");
    assert!(h.cache.get_active_call(1).await.unwrap().is_none());
}

/// Tests that a successful match records the initiator pair as recently
/// matched and notifies both webhooks.
#[tokio::test]
async fn match_records_exclusion_and_notifies_both_sides() {
    let h = harness().await;
    h.queue.enqueue(request(1, 10, 100)).await.unwrap();
    h.queue.enqueue(request(2, 20, 200)).await.unwrap();

    h.engine.sweep().await;

    assert!(h.cache.has_recent_match(100, 200).await.unwrap());

    let urls = h.gateway.executed_urls();
    assert!(urls.iter().any(|u| u.contains("/1/")));
    assert!(urls.iter().any(|u| u.contains("/2/")));
}

/// Tests the observability counters after one successful pairing.
#[tokio::test]
async fn stats_reflect_matches_and_queue_length() {
    let h = harness().await;
    h.engine.note_enqueued().await;
    h.engine.note_enqueued().await;
    h.queue.enqueue(request(1, 10, 100)).await.unwrap();
    h.queue.enqueue(request(2, 20, 200)).await.unwrap();

    h.engine.sweep().await;

    let stats = h.engine.stats().await;
    assert_eq!(stats.matched_pairs, 1);
    assert_eq!(stats.enqueued_requests, 2);
    assert!((stats.success_rate - 1.0).abs() < f64::EPSILON);
    assert_eq!(stats.queue_length, 0);
    assert!(stats.average_match_time_ms >= 0.0);
}

/// Tests that one sweep can produce several pairs.
#[tokio::test]
async fn sweep_pairs_everyone_it_can() {
    let h = harness().await;
    h.queue.enqueue(request(1, 10, 100)).await.unwrap();
    h.queue.enqueue(request(2, 20, 200)).await.unwrap();
    h.queue.enqueue(request(3, 30, 300)).await.unwrap();
    h.queue.enqueue(request(4, 40, 400)).await.unwrap();

    assert_eq!(h.engine.sweep().await, 2);
    assert!(h.queue.is_empty().await);
}
