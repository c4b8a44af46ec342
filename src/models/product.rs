use bigdecimal::BigDecimal;
use diesel::prelude::*;
use jiff_diesel::DateTime;

/// Product model for reading from the database.
///
/// `trending_score` is owned by the trending aggregation pipeline: it only
/// ever increases here. Other product fields are managed elsewhere and are
/// read-only to this service.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: i32,
    pub shop_id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub trending_score: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}
