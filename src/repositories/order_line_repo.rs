//! Order line repository for async database operations.
//!
//! The trending pipeline only ever reads order lines, and only through the
//! windowed projection below.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff_diesel::DateTime;

use crate::db::AsyncDbPool;
use crate::error::{AppError, DatabaseErrorConverter};
use crate::models::OrderLineRef;
use crate::schema::order_lines;

#[derive(Clone)]
pub struct OrderLineRepository {
    pool: AsyncDbPool,
}

impl OrderLineRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Loads the distinct `(order_line_id, product_id)` pairs whose creation
    /// timestamp falls in `[start_at, end_before)`, ordered by order line id.
    ///
    /// The bounds are expected to be calendar-day aligned: `start_at` is the
    /// first instant of the window's first day and `end_before` the first
    /// instant of the day after its last day.
    pub async fn find_refs_in_window(
        &self,
        start_at: DateTime,
        end_before: DateTime,
    ) -> Result<Vec<OrderLineRef>, AppError> {
        let mut conn = self.pool.get().await?;

        order_lines::table
            .filter(order_lines::created_at.ge(start_at))
            .filter(order_lines::created_at.lt(end_before))
            .select((order_lines::id, order_lines::product_id))
            .distinct()
            .order(order_lines::id.asc())
            .load::<OrderLineRef>(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::read("load order lines in window", e))
    }
}
