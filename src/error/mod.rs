pub mod app_error;
pub mod database;

pub use app_error::{AppError, AppResult};
pub use database::DatabaseErrorConverter;
