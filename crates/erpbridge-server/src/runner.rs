//! Serializes sync runs triggered from the API and the scheduler.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use erpbridge_db::{DbError, SyncRunRow};
use erpbridge_sync::SyncOrchestrator;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("a sync run is already in progress")]
    Busy,
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Starts at most one sync run at a time for this process.
#[derive(Clone)]
pub struct SyncRunner {
    pool: PgPool,
    orchestrator: SyncOrchestrator,
    erp_mode: String,
    lock: Arc<Mutex<()>>,
}

impl SyncRunner {
    #[must_use]
    pub fn new(pool: PgPool, orchestrator: SyncOrchestrator, erp_mode: impl Into<String>) -> Self {
        Self {
            pool,
            orchestrator,
            erp_mode: erp_mode.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// Records a queued run and executes it in the background.
    ///
    /// Returns the queued row immediately. The run lock is held until the
    /// background task has recorded the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Busy`] if another run holds the lock, or
    /// [`RunnerError::Db`] if the run record cannot be created.
    pub async fn try_start(
        &self,
        trigger_source: &'static str,
        modified_after: Option<DateTime<Utc>>,
    ) -> Result<SyncRunRow, RunnerError> {
        let guard = Arc::clone(&self.lock)
            .try_lock_owned()
            .map_err(|_| RunnerError::Busy)?;

        let run = erpbridge_db::create_sync_run(&self.pool, trigger_source, &self.erp_mode).await?;
        tracing::info!(run_id = %run.public_id, trigger_source, "sync run queued");

        let runner = self.clone();
        let run_id = run.id;
        tokio::spawn(async move {
            runner.execute(run_id, modified_after, guard).await;
        });

        Ok(run)
    }

    async fn execute(
        &self,
        run_id: i64,
        modified_after: Option<DateTime<Utc>>,
        _guard: OwnedMutexGuard<()>,
    ) {
        if let Err(e) = erpbridge_db::start_sync_run(&self.pool, run_id).await {
            tracing::error!(run_id, error = %e, "failed to start sync run");
            self.fail_best_effort(run_id, &e.to_string()).await;
            return;
        }

        let report = self.orchestrator.run(modified_after).await;

        if let Err(e) = erpbridge_db::complete_sync_run(&self.pool, run_id, &report).await {
            tracing::error!(run_id, error = %e, "failed to record sync run outcome");
            self.fail_best_effort(run_id, &e.to_string()).await;
            return;
        }

        tracing::info!(
            run_id,
            status = report.status.as_str(),
            processed = report.processed,
            errors = report.errors,
            "sync run recorded"
        );
    }

    async fn fail_best_effort(&self, run_id: i64, message: &str) {
        if let Err(mark_err) = erpbridge_db::fail_sync_run(&self.pool, run_id, message).await {
            tracing::error!(run_id, error = %mark_err, "failed to mark sync run as failed");
        }
    }
}

#[cfg(test)]
impl SyncRunner {
    /// Takes the run lock as if a run were in flight.
    pub(crate) fn hold_lock(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.lock)
            .try_lock_owned()
            .expect("run lock is free")
    }
}
