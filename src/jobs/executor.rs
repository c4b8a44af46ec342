use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::JobConfig;
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::indexer::dispatcher::IndexDispatcher;
use crate::jobs::types::{JobContext, JobStatus, JobTask};

/// Single-flight lock per job name.
///
/// A job whose previous run is still in flight is rejected, not queued:
/// overlapping aggregation runs would double-apply window deltas.
#[derive(Clone, Default)]
pub struct RunTracker {
    running: Arc<Mutex<HashSet<String>>>,
}

/// Releases the job name when the run finishes, on any exit path.
pub struct RunGuard {
    running: Arc<Mutex<HashSet<String>>>,
    job_name: String,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `job_name` for one run; `None` while a run is in flight.
    pub fn try_acquire(&self, job_name: &str) -> Option<RunGuard> {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !running.insert(job_name.to_string()) {
            return None;
        }
        Some(RunGuard {
            running: Arc::clone(&self.running),
            job_name: job_name.to_string(),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        running.remove(&self.job_name);
    }
}

/// Executes configured jobs with a single-flight lock and a hard timeout.
pub struct JobExecutor {
    db_pool: AsyncDbPool,
    index_dispatcher: Arc<dyn IndexDispatcher>,
    tracker: RunTracker,
    shutdown: CancellationToken,
}

impl JobExecutor {
    pub fn new(db_pool: AsyncDbPool, index_dispatcher: Arc<dyn IndexDispatcher>) -> Self {
        Self {
            db_pool,
            index_dispatcher,
            tracker: RunTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancels every in-flight run's token.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn execute_job(&self, job: &JobConfig, task: Box<dyn JobTask>) -> AppResult<()> {
        let Some(_guard) = self.tracker.try_acquire(&job.name) else {
            return Err(AppError::Conflict {
                message: format!("job '{}' is already running", job.name),
            });
        };

        let execution_id = Uuid::new_v4();
        // Child of the shutdown token, so stop() reaches running tasks.
        let cancellation_token = self.shutdown.child_token();

        let ctx = JobContext {
            execution_id,
            job_name: job.name.clone(),
            db_pool: self.db_pool.clone(),
            index_dispatcher: Arc::clone(&self.index_dispatcher),
            cancellation_token: cancellation_token.clone(),
        };

        tracing::info!(
            %execution_id,
            job_name = %job.name,
            job_type = %job.job_type,
            status = %JobStatus::Running,
            "Job execution started"
        );

        let start_time = tokio::time::Instant::now();
        let timeout_duration = Duration::from_secs(job.timeout_seconds);
        let result = tokio::time::timeout(timeout_duration, task.execute(ctx)).await;
        let duration_ms = start_time.elapsed().as_millis();

        match result {
            Ok(Ok(())) => {
                tracing::info!(
                    %execution_id,
                    job_name = %job.name,
                    duration_ms,
                    status = %JobStatus::Success,
                    "Job execution finished"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(
                    %execution_id,
                    job_name = %job.name,
                    duration_ms,
                    status = %JobStatus::Failed,
                    error = %e,
                    "Job execution failed"
                );
                Err(e)
            }
            Err(_) => {
                // Ask the task's in-flight work to stop before reporting.
                cancellation_token.cancel();
                tracing::error!(
                    %execution_id,
                    job_name = %job.name,
                    duration_ms,
                    status = %JobStatus::Timeout,
                    "Job execution timed out"
                );
                Err(AppError::Internal {
                    source: anyhow::anyhow!(
                        "job '{}' timed out after {}s",
                        job.name,
                        job.timeout_seconds
                    ),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use diesel_async::AsyncPgConnection;
    use diesel_async::pooled_connection::AsyncDieselConnectionManager;
    use diesel_async::pooled_connection::bb8::Pool;
    use tokio::sync::Notify;

    use super::*;
    use crate::indexer::event::IndexEvent;

    /// Pool that never connects; tasks under test ignore it.
    fn test_pool() -> AsyncDbPool {
        let manager =
            AsyncDieselConnectionManager::<AsyncPgConnection>::new("postgres://localhost/unused");
        Pool::builder().build_unchecked(manager)
    }

    struct NoopDispatcher;

    #[async_trait]
    impl IndexDispatcher for NoopDispatcher {
        async fn dispatch(&self, _event: &IndexEvent) -> AppResult<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "noop"
        }
    }

    fn job(name: &str, timeout_seconds: u64) -> JobConfig {
        JobConfig {
            name: name.to_string(),
            job_type: "test".to_string(),
            cron: "0 0 3 * * *".to_string(),
            enabled: true,
            timeout_seconds,
            payload: None,
        }
    }

    fn executor() -> Arc<JobExecutor> {
        Arc::new(JobExecutor::new(test_pool(), Arc::new(NoopDispatcher)))
    }

    #[derive(Debug)]
    struct ImmediateTask;

    #[async_trait]
    impl JobTask for ImmediateTask {
        fn task_type() -> &'static str {
            "immediate"
        }

        async fn execute(&self, _ctx: JobContext) -> AppResult<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingTask;

    #[async_trait]
    impl JobTask for FailingTask {
        fn task_type() -> &'static str {
            "failing"
        }

        async fn execute(&self, _ctx: JobContext) -> AppResult<()> {
            Err(AppError::Validation {
                field: "window_days".to_string(),
                reason: "must be between 1 and 3650, got 0".to_string(),
            })
        }
    }

    /// Signals when it starts and parks until released.
    #[derive(Debug)]
    struct BlockingTask {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl JobTask for BlockingTask {
        fn task_type() -> &'static str {
            "blocking"
        }

        async fn execute(&self, _ctx: JobContext) -> AppResult<()> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct SleepingTask;

    #[async_trait]
    impl JobTask for SleepingTask {
        fn task_type() -> &'static str {
            "sleeping"
        }

        async fn execute(&self, _ctx: JobContext) -> AppResult<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn runs_a_task_to_completion() {
        let executor = executor();
        executor
            .execute_job(&job("trending", 300), Box::new(ImmediateTask))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn task_errors_propagate() {
        let executor = executor();
        let err = executor
            .execute_job(&job("trending", 300), Box::new(FailingTask))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn overlapping_run_is_rejected() {
        let executor = executor();
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let first = {
            let executor = Arc::clone(&executor);
            let task = BlockingTask {
                started: Arc::clone(&started),
                release: Arc::clone(&release),
            };
            tokio::spawn(
                async move { executor.execute_job(&job("trending", 300), Box::new(task)).await },
            )
        };

        started.notified().await;
        let err = executor
            .execute_job(&job("trending", 300), Box::new(ImmediateTask))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        // A differently named job is not blocked.
        executor
            .execute_job(&job("other", 300), Box::new(ImmediateTask))
            .await
            .unwrap();

        release.notify_one();
        first.await.unwrap().unwrap();

        // Lock released once the first run finishes.
        executor
            .execute_job(&job("trending", 300), Box::new(ImmediateTask))
            .await
            .unwrap();
    }

    /// Completes only once its cancellation token fires.
    #[derive(Debug)]
    struct CancellationBoundTask;

    #[async_trait]
    impl JobTask for CancellationBoundTask {
        fn task_type() -> &'static str {
            "cancellation_bound"
        }

        async fn execute(&self, ctx: JobContext) -> AppResult<()> {
            ctx.cancellation_token.cancelled().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn shutdown_reaches_running_tasks() {
        let executor = executor();

        let run = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move {
                executor
                    .execute_job(&job("trending", 300), Box::new(CancellationBoundTask))
                    .await
            })
        };

        tokio::task::yield_now().await;
        executor.shutdown();
        run.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn run_past_its_timeout_is_cut_off() {
        let executor = executor();
        let err = executor
            .execute_job(&job("trending", 1), Box::new(SleepingTask))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));

        // The timed-out run no longer holds the single-flight lock.
        executor
            .execute_job(&job("trending", 300), Box::new(ImmediateTask))
            .await
            .unwrap();
    }
}
