//! Background job scheduler.
//!
//! Registers the recurring catalog sync when `ERPBRIDGE_SYNC_SCHEDULE` is set.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::runner::{RunnerError, SyncRunner};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    runner: SyncRunner,
    sync_schedule: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match sync_schedule {
        Some(cron) => register_sync_job(&scheduler, runner, cron).await?,
        None => tracing::info!("scheduler: no sync schedule configured; catalog sync is manual"),
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring full catalog sync.
///
/// A tick that lands while another run holds the lock is skipped; the next
/// tick picks up whatever changed.
async fn register_sync_job(
    scheduler: &JobScheduler,
    runner: SyncRunner,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let runner = runner.clone();

        Box::pin(async move {
            match runner.try_start("scheduler", None).await {
                Ok(run) => {
                    tracing::info!(run_id = %run.public_id, "scheduler: catalog sync queued");
                }
                Err(RunnerError::Busy) => {
                    tracing::info!("scheduler: previous sync still running; skipping tick");
                }
                Err(RunnerError::Db(e)) => {
                    tracing::error!(error = %e, "scheduler: failed to queue catalog sync");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: catalog sync registered");
    Ok(())
}
