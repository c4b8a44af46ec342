use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::indexer::dispatcher::IndexDispatcher;

/// Job execution context passed to tasks
#[derive(Clone)]
pub struct JobContext {
    pub execution_id: Uuid,
    pub job_name: String,
    pub db_pool: AsyncDbPool,
    pub index_dispatcher: Arc<dyn IndexDispatcher>,
    pub cancellation_token: CancellationToken,
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Success,
    Failed,
    Timeout,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Timeout => write!(f, "timeout"),
        }
    }
}

/// Trait that all job tasks must implement
#[async_trait]
pub trait JobTask: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this task type
    fn task_type() -> &'static str
    where
        Self: Sized;

    /// Execute the task
    async fn execute(&self, ctx: JobContext) -> AppResult<()>;

    /// Optional description
    fn description(&self) -> Option<String> {
        None
    }
}
