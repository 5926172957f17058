use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use super::support::request;
use crate::error::call::CallError;
use crate::service::call::queue::CallQueue;

/// Tests that the first request lands at position 1 of a queue of 1.
///
/// Expected: Ok with position=1, queue_length=1
#[tokio::test]
async fn first_enqueue_is_position_one() {
    let queue = CallQueue::new(Duration::from_secs(300));

    let status = queue.enqueue(request(1, 10, 100)).await.unwrap();

    assert_eq!(status.position, 1);
    assert_eq!(status.queue_length, 1);
    assert!(queue.is_queued(1).await);
}

/// Tests that a channel cannot be queued twice.
///
/// Expected: Err(ChannelAlreadyInQueue), queue unchanged
#[tokio::test]
async fn duplicate_channel_is_rejected() {
    let queue = CallQueue::new(Duration::from_secs(300));
    queue.enqueue(request(1, 10, 100)).await.unwrap();

    let result = queue.enqueue(request(1, 10, 999)).await;

    assert!(matches!(result, Err(CallError::ChannelAlreadyInQueue)));
    assert_eq!(queue.len().await, 1);
}

/// Tests service order: higher priority first, enqueue time breaking ties.
#[tokio::test]
async fn higher_priority_is_served_first() {
    let queue = CallQueue::new(Duration::from_secs(300));

    let mut early = request(1, 10, 100);
    early.requested_at = Utc::now() - ChronoDuration::seconds(30);
    queue.enqueue(early).await.unwrap();
    queue.enqueue(request(2, 20, 200)).await.unwrap();
    queue
        .enqueue(request(3, 30, 300).with_priority(1))
        .await
        .unwrap();

    let pending = queue.pending().await;
    let channels: Vec<u64> = pending.iter().map(|r| r.channel_id).collect();

    assert_eq!(channels, vec![3, 1, 2], "skipper first, then FIFO");
    assert_eq!(queue.queue_status(3).await.unwrap().position, 1);
    assert_eq!(queue.queue_status(2).await.unwrap().position, 3);
}

/// Tests explicit cancellation by channel.
#[tokio::test]
async fn dequeue_by_channel_removes_the_request() {
    let queue = CallQueue::new(Duration::from_secs(300));
    queue.enqueue(request(1, 10, 100)).await.unwrap();

    let removed = queue.dequeue_by_channel(1).await;

    assert_eq!(removed.map(|r| r.channel_id), Some(1));
    assert!(!queue.is_queued(1).await);
    assert!(queue.dequeue_by_channel(1).await.is_none());
}

/// Tests that expired requests are invisible to reads and returned by the
/// eviction sweep exactly once.
#[tokio::test]
async fn expired_requests_are_hidden_then_evicted() {
    let queue = CallQueue::new(Duration::from_secs(60));

    let mut stale = request(1, 10, 100);
    stale.requested_at = Utc::now() - ChronoDuration::seconds(120);
    queue.enqueue(stale).await.unwrap();
    queue.enqueue(request(2, 20, 200)).await.unwrap();

    assert_eq!(queue.len().await, 1);
    assert!(!queue.is_queued(1).await);
    assert!(queue.queue_status(1).await.is_none());
    let pending = queue.pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].channel_id, 2);

    let evicted = queue.evict_expired().await;
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].channel_id, 1);
    assert!(queue.evict_expired().await.is_empty());
}

/// Tests that an expired entry does not block the channel from re-queueing.
#[tokio::test]
async fn expired_entry_does_not_block_reenqueue() {
    let queue = CallQueue::new(Duration::from_secs(60));

    let mut stale = request(1, 10, 100);
    stale.requested_at = Utc::now() - ChronoDuration::seconds(120);
    queue.enqueue(stale).await.unwrap();

    let status = queue.enqueue(request(1, 10, 100)).await.unwrap();
    assert_eq!(status.position, 1);
}

/// Tests the atomic pair-take used as the matching commit step.
///
/// Expected: both requests removed together, or neither
#[tokio::test]
async fn take_pair_is_all_or_nothing() {
    let queue = CallQueue::new(Duration::from_secs(300));
    let a = request(1, 10, 100);
    let b = request(2, 20, 200);
    let (id_a, id_b) = (a.id.clone(), b.id.clone());
    queue.enqueue(a).await.unwrap();
    queue.enqueue(b).await.unwrap();

    let taken = queue.take_pair(&id_a, &id_b).await.unwrap();
    assert_eq!(taken.0.id, id_a);
    assert_eq!(taken.1.id, id_b);
    assert!(queue.is_empty().await);

    // One of the pair is gone: nothing is removed.
    let c = request(3, 30, 300);
    let id_c = c.id.clone();
    queue.enqueue(c).await.unwrap();
    assert!(queue.take_pair(&id_c, &id_b).await.is_none());
    assert!(queue.is_queued(3).await, "survivor stays queued");
}

/// Tests that restore puts a taken request back without duplicating.
#[tokio::test]
async fn restore_reinserts_once() {
    let queue = CallQueue::new(Duration::from_secs(300));
    let a = request(1, 10, 100);
    queue.enqueue(a.clone()).await.unwrap();
    let taken = queue.dequeue(&a.id).await.unwrap();

    queue.restore(taken.clone()).await;
    queue.restore(taken).await;

    assert_eq!(queue.len().await, 1);
}
