//! Product-to-shop resolution for one aggregation run.
//!
//! Each distinct product id seen in the window is resolved at most once;
//! resolutions for different products are independent and run on a bounded
//! worker pool.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::AppResult;
use crate::models::{Product, Shop};
use crate::trending::store::TrendingStore;

pub struct ProductShopResolver {
    store: Arc<dyn TrendingStore>,
    concurrency: usize,
}

impl ProductShopResolver {
    pub fn new(store: Arc<dyn TrendingStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolves every distinct product id in `product_ids` to its
    /// `(Product, Shop)` pair.
    ///
    /// Any resolution failure aborts the whole lookup: an aggregation built
    /// from partially resolved data would be worse than no update.
    pub async fn resolve_all(
        &self,
        product_ids: &[i32],
    ) -> AppResult<HashMap<i32, (Product, Shop)>> {
        let mut seen = HashSet::new();
        let distinct: Vec<i32> = product_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        stream::iter(distinct.into_iter().map(|id| {
            let store = Arc::clone(&self.store);
            async move { store.product_with_shop(id).await.map(|pair| (id, pair)) }
        }))
        .buffer_unordered(self.concurrency)
        .try_collect()
        .await
    }
}
