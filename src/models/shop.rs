use diesel::prelude::*;
use jiff_diesel::DateTime;

/// Shop model for reading from the database.
///
/// The list of a shop's trending products is never persisted; it exists only
/// inside one aggregation run's working memory.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::shops)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Shop {
    pub id: i32,
    pub name: String,
    pub trending_score: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}
