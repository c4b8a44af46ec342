//! Score updates for one aggregation run.
//!
//! Shops are independent and processed concurrently; within one shop the
//! product updates run sequentially so the shop's accumulated delta is exact
//! before the shop row itself is written. A failed product save is skipped
//! and its delta excluded from the shop total.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::indexer::event::IndexEvent;
use crate::indexer::queue::DispatchQueue;
use crate::trending::aggregate::{Aggregation, ShopAggregate};
use crate::trending::resolver::ProductShopResolver;
use crate::trending::store::TrendingStore;
use crate::trending::window::TrendingWindow;

/// Entity-level accounting for one run's score updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreTotals {
    pub updated: u32,
    pub failed: u32,
}

impl ScoreTotals {
    fn merge(self, other: ScoreTotals) -> ScoreTotals {
        ScoreTotals {
            updated: self.updated + other.updated,
            failed: self.failed + other.failed,
        }
    }
}

pub struct TrendingPipeline {
    store: Arc<dyn TrendingStore>,
    resolver: ProductShopResolver,
    shop_concurrency: usize,
}

impl TrendingPipeline {
    pub fn new(
        store: Arc<dyn TrendingStore>,
        resolver_concurrency: usize,
        shop_concurrency: usize,
    ) -> Self {
        let resolver = ProductShopResolver::new(Arc::clone(&store), resolver_concurrency);
        Self {
            store,
            resolver,
            shop_concurrency: shop_concurrency.max(1),
        }
    }

    /// Runs window read, resolution, aggregation, and score updates.
    ///
    /// Read failures abort with no side effects; save failures are isolated
    /// per entity and only counted. Emitted index events go through `queue`
    /// and never influence the outcome.
    pub async fn run(
        &self,
        window: TrendingWindow,
        queue: &DispatchQueue,
        cancel: &CancellationToken,
    ) -> AppResult<ScoreTotals> {
        let refs = self.store.window_order_lines(&window).await?;
        let product_ids: Vec<i32> = refs.iter().map(|r| r.product_id).collect();

        if product_ids.is_empty() {
            tracing::info!(
                window_start = %window.start(),
                window_end = %window.end(),
                "No order lines in window, nothing to update"
            );
            return Ok(ScoreTotals::default());
        }

        let resolved = self.resolver.resolve_all(&product_ids).await?;
        let aggregation = Aggregation::build(&product_ids, &resolved);

        tracing::debug!(
            order_lines = refs.len(),
            products = aggregation.product_count(),
            shops = aggregation.shop_count(),
            "Aggregation built"
        );

        let (window_counts, shops) = aggregation.into_parts();
        let counts = Arc::new(window_counts);

        let totals = stream::iter(shops.into_iter())
            .map(|shop_agg| {
                let counts = Arc::clone(&counts);
                async move {
                    if cancel.is_cancelled() {
                        tracing::debug!(
                            shop_id = shop_agg.shop.id,
                            "Run cancelled, shop left untouched"
                        );
                        return ScoreTotals::default();
                    }
                    self.update_shop(shop_agg, &counts, queue).await
                }
            })
            .buffer_unordered(self.shop_concurrency)
            .fold(ScoreTotals::default(), |acc, totals| async move {
                acc.merge(totals)
            })
            .await;

        Ok(totals)
    }

    /// Applies one shop's product deltas and then the shop's own total.
    async fn update_shop(
        &self,
        aggregate: ShopAggregate,
        counts: &HashMap<i32, i64>,
        queue: &DispatchQueue,
    ) -> ScoreTotals {
        let ShopAggregate { shop, products } = aggregate;
        let mut totals = ScoreTotals::default();
        let mut shop_delta: i64 = 0;

        for product in products {
            let delta = counts.get(&product.id).copied().unwrap_or(0);
            match self
                .store
                .save_product_score(product.id, product.trending_score + delta)
                .await
            {
                Ok(saved) => {
                    totals.updated += 1;
                    shop_delta += delta;
                    queue.enqueue(IndexEvent::product(&saved));
                }
                Err(e) => {
                    totals.failed += 1;
                    tracing::warn!(
                        product_id = product.id,
                        shop_id = shop.id,
                        error = %e,
                        "Product score update failed, entity skipped"
                    );
                }
            }
        }

        // The shop total only reflects deltas that actually landed.
        if shop_delta > 0 {
            match self
                .store
                .save_shop_score(shop.id, shop.trending_score + shop_delta)
                .await
            {
                Ok(saved) => {
                    totals.updated += 1;
                    queue.enqueue(IndexEvent::shop(&saved));
                }
                Err(e) => {
                    totals.failed += 1;
                    tracing::warn!(
                        shop_id = shop.id,
                        error = %e,
                        "Shop score update failed, entity skipped"
                    );
                }
            }
        } else {
            tracing::debug!(
                shop_id = shop.id,
                "No product delta landed for shop, score left unchanged"
            );
        }

        totals
    }
}
