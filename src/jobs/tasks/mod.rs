pub mod trending_aggregation;

pub use trending_aggregation::TrendingAggregationTask;
