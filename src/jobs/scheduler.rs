use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};

use crate::config::JobConfig;
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::indexer::dispatcher::IndexDispatcher;
use crate::jobs::executor::JobExecutor;
use crate::jobs::registry::JobRegistry;

/// Wrapper around tokio-cron-scheduler driving the configured jobs
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    executor: Arc<JobExecutor>,
    registry: Arc<JobRegistry>,
}

impl JobScheduler {
    pub async fn new(
        db_pool: AsyncDbPool,
        index_dispatcher: Arc<dyn IndexDispatcher>,
        registry: JobRegistry,
    ) -> AppResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            executor: Arc::new(JobExecutor::new(db_pool, index_dispatcher)),
            registry: Arc::new(registry),
        })
    }

    /// Schedules every enabled job and starts the scheduler.
    pub async fn start(&self, jobs: &[JobConfig]) -> AppResult<()> {
        for job in jobs {
            if !job.enabled {
                tracing::info!(job_name = %job.name, "Job disabled, skipping");
                continue;
            }
            self.schedule_job(job.clone()).await?;
        }

        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) -> AppResult<()> {
        self.executor.shutdown();
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        Ok(())
    }

    async fn schedule_job(&self, job: JobConfig) -> AppResult<()> {
        // Fail at startup, not at first trigger, when the payload is bad.
        self.registry.create_task(
            &job.job_type,
            job.payload.clone().unwrap_or(serde_json::json!({})),
        )?;

        let executor = Arc::clone(&self.executor);
        let registry = Arc::clone(&self.registry);
        let job_clone = job.clone();

        let cron_job = Job::new_async(job.cron.as_str(), move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let registry = Arc::clone(&registry);
            let job = job_clone.clone();

            Box::pin(async move {
                let payload = job.payload.clone().unwrap_or(serde_json::json!({}));

                match registry.create_task(&job.job_type, payload) {
                    Ok(task) => {
                        if let Err(e) = executor.execute_job(&job, task).await {
                            tracing::error!(job_name = %job.name, error = %e, "Job execution failed");
                        }
                    }
                    Err(e) => {
                        tracing::error!(job_name = %job.name, error = %e, "Failed to create task");
                    }
                }
            })
        })
        .map_err(|e| AppError::Validation {
            field: format!("jobs.{}.cron", job.name),
            reason: format!("invalid cron expression: {e}"),
        })?;

        self.scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        tracing::info!(
            job_name = %job.name,
            job_type = %job.job_type,
            cron = %job.cron,
            "Job scheduled"
        );

        Ok(())
    }
}
