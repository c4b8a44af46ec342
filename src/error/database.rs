//! Conversion of diesel errors into [`AppError`] with operation context.
//!
//! Reads feeding the aggregation are structurally required, so their errors
//! become `DataAccess`; writes are isolated per entity and become `Persist`.

use crate::error::AppError;

pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a diesel error raised by a read that the run cannot proceed
    /// without.
    pub fn read(operation: &str, error: diesel::result::Error) -> AppError {
        AppError::data_access(operation, error)
    }

    /// Converts a diesel error raised while saving a single entity.
    pub fn write(entity: &'static str, id: i32, error: diesel::result::Error) -> AppError {
        AppError::persist(entity, id, error)
    }
}
