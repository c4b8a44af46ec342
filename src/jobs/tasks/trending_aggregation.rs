use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::jobs::types::{JobContext, JobTask};
use crate::trending::store::DieselTrendingStore;
use crate::trending::{RunOptions, run_trending_aggregation};

/// Scheduled recomputation of trending scores over the trailing order window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingAggregationTask {
    #[serde(flatten)]
    pub options: RunOptions,
}

#[async_trait]
impl JobTask for TrendingAggregationTask {
    fn task_type() -> &'static str
    where
        Self: Sized,
    {
        "trending_aggregation"
    }

    async fn execute(&self, ctx: JobContext) -> AppResult<()> {
        let store = Arc::new(DieselTrendingStore::new(ctx.db_pool));

        let result = run_trending_aggregation(
            store,
            ctx.index_dispatcher,
            &self.options,
            &ctx.cancellation_token,
        )
        .await?;

        tracing::info!(
            execution_id = %ctx.execution_id,
            updated_count = result.updated_count,
            failed_count = result.failed_count,
            dispatch_failures = result.dispatch_failures,
            "Trending aggregation completed"
        );

        Ok(())
    }

    fn description(&self) -> Option<String> {
        Some(format!(
            "Recompute trending scores over the trailing {} days",
            self.options.window_days
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_fields_are_flattened_with_defaults() {
        let task: TrendingAggregationTask =
            serde_json::from_value(serde_json::json!({"window_days": 7})).unwrap();
        assert_eq!(task.options.window_days, 7);
        assert_eq!(task.options.shop_concurrency, 4);
    }

    #[test]
    fn empty_payload_uses_defaults() {
        let task: TrendingAggregationTask = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(task.options.window_days, 15);
        assert_eq!(task.options.dispatch_queue_capacity, 256);
    }
}
