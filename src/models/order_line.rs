use diesel::prelude::*;

/// The pipeline's read-only view of one order line inside the trailing
/// window: the distinct `(order_line_id, product_id)` pair projected from
/// the `order_lines` table. Order lines are immutable once created and this
/// service never writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Queryable)]
pub struct OrderLineRef {
    pub order_line_id: i64,
    pub product_id: i32,
}
