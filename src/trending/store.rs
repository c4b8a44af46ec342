//! Data store seam for the trending pipeline.
//!
//! The trait covers exactly the three query surfaces the aggregation
//! consumes: the windowed order-line read, the product-with-shop lookup,
//! and the two score saves. The production implementation delegates to the
//! diesel repositories.

use async_trait::async_trait;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{OrderLineRef, Product, Shop};
use crate::repositories::{OrderLineRepository, ProductRepository, ShopRepository};
use crate::trending::window::TrendingWindow;

#[async_trait]
pub trait TrendingStore: Send + Sync {
    /// Distinct `(order_line_id, product_id)` pairs in the window, ordered
    /// by order line id.
    async fn window_order_lines(&self, window: &TrendingWindow) -> AppResult<Vec<OrderLineRef>>;

    /// A product together with its owning shop, in one round trip.
    ///
    /// A missing product is data corruption, not a recoverable miss: order
    /// lines must reference real products.
    async fn product_with_shop(&self, product_id: i32) -> AppResult<(Product, Shop)>;

    /// Persists a product's trending score; returns the stored row.
    async fn save_product_score(&self, product_id: i32, score: i64) -> AppResult<Product>;

    /// Persists a shop's trending score; returns the stored row.
    async fn save_shop_score(&self, shop_id: i32, score: i64) -> AppResult<Shop>;
}

#[derive(Clone)]
pub struct DieselTrendingStore {
    order_lines: OrderLineRepository,
    products: ProductRepository,
    shops: ShopRepository,
}

impl DieselTrendingStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            order_lines: OrderLineRepository::new(pool.clone()),
            products: ProductRepository::new(pool.clone()),
            shops: ShopRepository::new(pool),
        }
    }
}

#[async_trait]
impl TrendingStore for DieselTrendingStore {
    async fn window_order_lines(&self, window: &TrendingWindow) -> AppResult<Vec<OrderLineRef>> {
        self.order_lines
            .find_refs_in_window(window.start_at().into(), window.end_before().into())
            .await
    }

    async fn product_with_shop(&self, product_id: i32) -> AppResult<(Product, Shop)> {
        self.products
            .find_with_shop(product_id)
            .await?
            .ok_or_else(|| {
                AppError::data_access(
                    "resolve product with shop",
                    anyhow::anyhow!(
                        "product {product_id} referenced by an order line does not exist"
                    ),
                )
            })
    }

    async fn save_product_score(&self, product_id: i32, score: i64) -> AppResult<Product> {
        self.products.update_trending_score(product_id, score).await
    }

    async fn save_shop_score(&self, shop_id: i32, score: i64) -> AppResult<Shop> {
        self.shops.update_trending_score(shop_id, score).await
    }
}
