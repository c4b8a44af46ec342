//! Shoptrend
//!
//! Periodic trending-score aggregation for products and shops, driven by
//! recent order history, with index-update events published for the
//! search-indexing service.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod indexer;
pub mod jobs;
pub mod logger;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod trending;
