//! Shop repository for async database operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, DatabaseErrorConverter};
use crate::models::Shop;
use crate::schema::shops;

#[derive(Clone)]
pub struct ShopRepository {
    pool: AsyncDbPool,
}

impl ShopRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Persists a shop's trending score and returns the stored row.
    pub async fn update_trending_score(&self, shop_id: i32, score: i64) -> Result<Shop, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::update(shops::table.find(shop_id))
            .set(shops::trending_score.eq(score))
            .returning(Shop::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::write("shop", shop_id, e))
    }
}
