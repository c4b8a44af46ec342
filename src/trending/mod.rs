//! Trending score aggregation over a trailing order window.
//!
//! One run reads the window's order lines, resolves each purchased product
//! to its shop, counts purchases, adds the counts onto the stored scores and
//! publishes an index event per persisted row. Every run starts from empty
//! state; the stored scores are the only thing carried between runs.

pub mod aggregate;
pub mod pipeline;
pub mod resolver;
pub mod store;
pub mod window;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::indexer::dispatcher::IndexDispatcher;
use crate::indexer::queue::DispatchQueue;

pub use pipeline::TrendingPipeline;
pub use store::{DieselTrendingStore, TrendingStore};
pub use window::TrendingWindow;

/// Tuning knobs for one aggregation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Trailing days of order history to aggregate
    pub window_days: i64,
    /// Concurrent product-with-shop lookups
    pub resolver_concurrency: usize,
    /// Shops whose score updates may run at the same time
    pub shop_concurrency: usize,
    /// Buffered index events before enqueueing starts dropping
    pub dispatch_queue_capacity: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            window_days: 15,
            resolver_concurrency: 8,
            shop_concurrency: 4,
            dispatch_queue_capacity: 256,
        }
    }
}

/// Outcome of one completed aggregation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Entities (products and shops) whose scores were persisted
    pub updated_count: u32,
    /// Entities whose score save failed and was skipped
    pub failed_count: u32,
    /// Index events that never reached the channel: send errors plus
    /// back-pressure drops
    pub dispatch_failures: u64,
}

/// Runs one aggregation over the trailing window ending today.
pub async fn run_trending_aggregation(
    store: Arc<dyn TrendingStore>,
    dispatcher: Arc<dyn IndexDispatcher>,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> AppResult<RunResult> {
    let window = TrendingWindow::trailing(options.window_days)?;
    run_for_window(store, dispatcher, window, options, cancel).await
}

/// Runs one aggregation over an explicit window.
///
/// The dispatch queue is always drained before returning, so a fatal
/// pipeline error never strands the background worker.
pub async fn run_for_window(
    store: Arc<dyn TrendingStore>,
    dispatcher: Arc<dyn IndexDispatcher>,
    window: TrendingWindow,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> AppResult<RunResult> {
    tracing::info!(
        window_start = %window.start(),
        window_end = %window.end(),
        "Trending aggregation run starting"
    );

    let queue = DispatchQueue::start(dispatcher, options.dispatch_queue_capacity);
    let pipeline = TrendingPipeline::new(
        store,
        options.resolver_concurrency,
        options.shop_concurrency,
    );

    let outcome = pipeline.run(window, &queue, cancel).await;
    let stats = queue.close().await;
    let totals = outcome?;

    let result = RunResult {
        updated_count: totals.updated,
        failed_count: totals.failed,
        dispatch_failures: stats.misses(),
    };

    tracing::info!(
        updated = result.updated_count,
        failed = result.failed_count,
        dispatch_failures = result.dispatch_failures,
        delivered = stats.delivered,
        "Trending aggregation run finished"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use jiff::civil::date;

    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::indexer::event::IndexEvent;
    use crate::trending::store::memory::MemoryStore;

    struct UnreachableChannel;

    #[async_trait]
    impl IndexDispatcher for UnreachableChannel {
        async fn dispatch(&self, event: &IndexEvent) -> AppResult<()> {
            Err(AppError::dispatch(
                event.destination.as_str(),
                anyhow::anyhow!("connection refused"),
            ))
        }

        fn name(&self) -> &'static str {
            "unreachable"
        }
    }

    struct SilentChannel;

    #[async_trait]
    impl IndexDispatcher for SilentChannel {
        async fn dispatch(&self, _event: &IndexEvent) -> AppResult<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "silent"
        }
    }

    fn window() -> TrendingWindow {
        TrendingWindow::ending_on(date(2025, 6, 16), 15).unwrap()
    }

    #[tokio::test]
    async fn reports_structured_outcome() {
        let store = Arc::new(
            MemoryStore::new()
                .with_shop(1, 10)
                .with_product(1, 1, 5)
                .with_product(2, 1, 2)
                .with_order_line(1, 1)
                .with_order_line(2, 1)
                .with_order_line(3, 1)
                .with_order_line(4, 2),
        );

        let result = run_for_window(
            store,
            Arc::new(SilentChannel),
            window(),
            &RunOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            result,
            RunResult {
                updated_count: 3,
                failed_count: 0,
                dispatch_failures: 0,
            }
        );
    }

    #[tokio::test]
    async fn counts_dispatch_failures_separately_from_score_failures() {
        let store = Arc::new(
            MemoryStore::new()
                .with_shop(1, 0)
                .with_product(1, 1, 0)
                .with_order_line(1, 1),
        );

        let result = run_for_window(
            store,
            Arc::new(UnreachableChannel),
            window(),
            &RunOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.updated_count, 2);
        assert_eq!(result.failed_count, 0);
        assert_eq!(result.dispatch_failures, 2);
    }

    #[tokio::test]
    async fn fatal_read_error_still_drains_the_queue() {
        let store = Arc::new(MemoryStore::new().failing_window_read());

        let err = run_for_window(
            store,
            Arc::new(SilentChannel),
            window(),
            &RunOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::DataAccess { .. }));
    }

    #[test]
    fn run_options_deserialize_with_defaults() {
        let options: RunOptions = serde_json::from_str(r#"{"window_days": 30}"#).unwrap();
        assert_eq!(options.window_days, 30);
        assert_eq!(options.resolver_concurrency, 8);
        assert_eq!(options.shop_concurrency, 4);
        assert_eq!(options.dispatch_queue_capacity, 256);
    }
}
