//! Background matching engine.
//!
//! Pairs queued requests into calls on a fixed-interval sweep. Selection is
//! optimistic: candidates are chosen from a snapshot of the queue, and the
//! commit step re-validates both requests' membership by atomically taking
//! them out ([`CallQueue::take_pair`]). A request cancelled between
//! selection and commit makes the commit a benign no-op; the sweep simply
//! retries with fresh state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{error, info, warn};

use crate::cache::CallCache;
use crate::data::CallRepository;
use crate::error::call::CallError;
use crate::model::call::{ActiveCall, CallRequest, MatchOutcome, MatchingStats};
use crate::service::call::events::CallEvent;
use crate::service::call::notify::CallNotifier;
use crate::service::call::queue::CallQueue;

#[derive(Default)]
struct StatsInner {
    enqueued_requests: u64,
    matched_pairs: u64,
    total_match_time_ms: i64,
}

pub struct MatchingEngine {
    db: DatabaseConnection,
    queue: Arc<CallQueue>,
    cache: Arc<dyn CallCache>,
    notifier: Arc<CallNotifier>,
    sweep_interval: Duration,
    stats: RwLock<StatsInner>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl MatchingEngine {
    pub fn new(
        db: DatabaseConnection,
        queue: Arc<CallQueue>,
        cache: Arc<dyn CallCache>,
        notifier: Arc<CallNotifier>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            db,
            queue,
            cache,
            notifier,
            sweep_interval,
            stats: RwLock::new(StatsInner::default()),
            shutdown: Mutex::new(None),
        }
    }

    /// Starts the background sweep. Idempotent while running.
    pub async fn start(self: Arc<Self>) {
        let mut shutdown = self.shutdown.lock().await;
        if shutdown.is_some() {
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        *shutdown = Some(tx);
        drop(shutdown);

        let engine = Arc::clone(&self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.sweep_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.sweep().await;
                    }
                    _ = rx.changed() => {
                        info!("matching engine stopped");
                        break;
                    }
                }
            }
        });
        info!(interval_secs = self.sweep_interval.as_secs(), "matching engine started");
    }

    /// Signals the background sweep to stop.
    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(true);
        }
    }

    /// Counts a freshly enqueued request for the success-rate statistic.
    pub async fn note_enqueued(&self) {
        self.stats.write().await.enqueued_requests += 1;
    }

    /// One pass over the pending queue. Returns the number of calls created.
    pub async fn sweep(&self) -> usize {
        // Timed-out requests leave the queue before pairing; each affected
        // channel hears about it.
        for expired in self.queue.evict_expired().await {
            self.notifier
                .notify_webhook(&expired.webhook_url, &CallEvent::Timeout)
                .await;
        }

        let pending = self.queue.pending().await;
        let mut consumed: HashSet<String> = HashSet::new();
        let mut matches = 0;

        for i in 0..pending.len() {
            let request = &pending[i];
            if consumed.contains(&request.id) {
                continue;
            }

            for candidate in pending.iter().skip(i + 1) {
                if consumed.contains(&candidate.id) || !eligible(request, candidate) {
                    continue;
                }
                if self.is_recent_pair(request, candidate).await {
                    continue;
                }

                match self.commit(request, candidate).await {
                    Ok(Some(_call)) => {
                        consumed.insert(request.id.clone());
                        consumed.insert(candidate.id.clone());
                        matches += 1;
                        break;
                    }
                    Ok(None) => {
                        // One of the two vanished between selection and
                        // commit; keep scanning with the next candidate.
                        continue;
                    }
                    Err(e) => {
                        error!("match commit failed, requests restored: {e}");
                        break;
                    }
                }
            }
        }

        matches
    }

    /// Attempts to match a single request against the current queue.
    pub async fn find_match(&self, request: &CallRequest) -> Result<MatchOutcome, CallError> {
        let pending = self.queue.pending().await;

        for candidate in &pending {
            if candidate.id == request.id || !eligible(request, candidate) {
                continue;
            }
            if self.is_recent_pair(request, candidate).await {
                continue;
            }

            match self.commit(request, candidate).await? {
                Some(call) => {
                    let newest = request.requested_at.max(candidate.requested_at);
                    let match_time_ms = Utc::now()
                        .signed_duration_since(newest)
                        .num_milliseconds()
                        .max(0);
                    return Ok(MatchOutcome::Matched {
                        call,
                        match_time_ms,
                    });
                }
                None => continue,
            }
        }

        Ok(MatchOutcome::Unmatched)
    }

    /// Observability snapshot; not used for correctness decisions.
    pub async fn stats(&self) -> MatchingStats {
        let queue_length = self.queue.len().await;
        let stats = self.stats.read().await;
        let average_match_time_ms = if stats.matched_pairs == 0 {
            0.0
        } else {
            stats.total_match_time_ms as f64 / stats.matched_pairs as f64
        };
        let success_rate = if stats.enqueued_requests == 0 {
            0.0
        } else {
            (stats.matched_pairs * 2) as f64 / stats.enqueued_requests as f64
        };
        MatchingStats {
            enqueued_requests: stats.enqueued_requests,
            matched_pairs: stats.matched_pairs,
            average_match_time_ms,
            success_rate,
            queue_length,
        }
    }

    /// Recent-match lookup that fails closed: a cache error blocks the pair
    /// rather than risking a rematch inside the exclusion window.
    async fn is_recent_pair(&self, a: &CallRequest, b: &CallRequest) -> bool {
        match self
            .cache
            .has_recent_match(a.initiator_id, b.initiator_id)
            .await
        {
            Ok(recent) => recent,
            Err(e) => {
                warn!("recent-match lookup failed, skipping candidate: {e}");
                true
            }
        }
    }

    /// Commit step: re-validate queue membership, persist, cache, record the
    /// pairing.
    ///
    /// `Ok(None)` means the pair no longer exists in the queue (benign
    /// conflict). On persistence or cache failure everything done so far is
    /// undone and both requests go back into the queue.
    async fn commit(
        &self,
        a: &CallRequest,
        b: &CallRequest,
    ) -> Result<Option<ActiveCall>, CallError> {
        let Some((req_a, req_b)) = self.queue.take_pair(&a.id, &b.id).await else {
            return Ok(None);
        };

        let call = ActiveCall::connect(&req_a, &req_b);
        let repo = CallRepository::new(&self.db);

        if let Err(e) = repo.create(&call).await {
            self.queue.restore(req_a).await;
            self.queue.restore(req_b).await;
            return Err(e.into());
        }

        if let Err(e) = self.cache.cache_active_call(&call).await {
            // Without the cache entry nothing would route to this call, so
            // undo the durable row too rather than leaving half a match.
            if let Err(db_err) = repo.delete(&call.id).await {
                error!("failed to undo call row after cache error: {db_err}");
            }
            self.queue.restore(req_a).await;
            self.queue.restore(req_b).await;
            return Err(e.into());
        }

        if let Err(e) = self
            .cache
            .record_recent_match(req_a.initiator_id, req_b.initiator_id)
            .await
        {
            warn!("failed to record recent match: {e}");
        }

        let newest = req_a.requested_at.max(req_b.requested_at);
        let match_time_ms = Utc::now()
            .signed_duration_since(newest)
            .num_milliseconds()
            .max(0);
        {
            let mut stats = self.stats.write().await;
            stats.matched_pairs += 1;
            stats.total_match_time_ms += match_time_ms;
        }

        self.notifier
            .notify_call(
                &call,
                &CallEvent::Matched {
                    call_id: call.id.clone(),
                },
            )
            .await;

        info!(call_id = %call.id, "paired two channels into a call");
        Ok(Some(call))
    }
}

/// Two requests may be paired when they come from different channels on
/// different servers.
fn eligible(a: &CallRequest, b: &CallRequest) -> bool {
    a.channel_id != b.channel_id && a.guild_id != b.guild_id
}
