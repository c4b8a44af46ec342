//! Product repository for async database operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, DatabaseErrorConverter};
use crate::models::{Product, Shop};
use crate::schema::{products, shops};

#[derive(Clone)]
pub struct ProductRepository {
    pool: AsyncDbPool,
}

impl ProductRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Fetches a product together with its owning shop in one round trip.
    ///
    /// Returns `None` when the product does not exist; the caller decides
    /// whether that is recoverable.
    pub async fn find_with_shop(
        &self,
        product_id: i32,
    ) -> Result<Option<(Product, Shop)>, AppError> {
        let mut conn = self.pool.get().await?;

        products::table
            .inner_join(shops::table)
            .filter(products::id.eq(product_id))
            .select((Product::as_select(), Shop::as_select()))
            .first::<(Product, Shop)>(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::read("load product with shop", e))
    }

    /// Persists a product's trending score and returns the stored row.
    pub async fn update_trending_score(
        &self,
        product_id: i32,
        score: i64,
    ) -> Result<Product, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::update(products::table.find(product_id))
            .set(products::trending_score.eq(score))
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::write("product", product_id, e))
    }
}
