use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::data::CallRepository;
use crate::error::AppError;
use crate::service::call::events::CallEvent;
use crate::service::call::notify::CallNotifier;
use crate::service::call::queue::CallQueue;

/// Starts the call maintenance jobs.
///
/// - every 15 seconds: evict queue requests that outlived the queue timeout
///   and notify the initiating channels
/// - every 5 minutes: purge ended calls older than the retention grace
///   period, except those pinned by an open report
///
/// # Arguments
/// - `db`: Database connection
/// - `queue`: Shared pending-call queue
/// - `notifier`: Notification service for timeout messages
/// - `retention_grace`: Age an ended call must reach before being purged
pub async fn start_schedulers(
    db: DatabaseConnection,
    queue: Arc<CallQueue>,
    notifier: Arc<CallNotifier>,
    retention_grace: Duration,
) -> Result<JobScheduler, AppError> {
    let scheduler = JobScheduler::new().await?;

    // Clone resources for the timeout job
    let job_queue = queue.clone();
    let job_notifier = notifier.clone();

    let timeout_job = Job::new_async("*/15 * * * * *", move |_uuid, _lock| {
        let queue = job_queue.clone();
        let notifier = job_notifier.clone();

        Box::pin(async move {
            for expired in queue.evict_expired().await {
                info!(
                    channel_id = expired.channel_id,
                    "queued call request timed out"
                );
                notifier
                    .notify_webhook(&expired.webhook_url, &CallEvent::Timeout)
                    .await;
            }
        })
    })?;
    scheduler.add(timeout_job).await?;

    // Clone resources for the retention job
    let job_db = db.clone();

    let retention_job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        let db = job_db.clone();

        Box::pin(async move {
            if let Err(e) = purge_old_calls(&db, retention_grace).await {
                error!("Error purging old calls: {e}");
            }
        })
    })?;
    scheduler.add(retention_job).await?;

    scheduler.start().await?;
    info!("call maintenance scheduler started");

    Ok(scheduler)
}

/// Deletes ended calls whose end predates the grace period, keeping rows
/// pinned by an open report. Active calls are never touched.
async fn purge_old_calls(
    db: &DatabaseConnection,
    retention_grace: Duration,
) -> Result<(), AppError> {
    let cutoff = Utc::now()
        - chrono::Duration::seconds(retention_grace.as_secs().min(i64::MAX as u64) as i64);

    let purged = CallRepository::new(db).purge_ended_before(cutoff).await?;
    if purged > 0 {
        info!(purged, "purged ended calls past retention");
    }
    Ok(())
}
