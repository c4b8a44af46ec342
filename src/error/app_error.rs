use thiserror::Error;

/// Application-wide error type.
///
/// The variants encode how an error propagates through an aggregation run:
/// `DataAccess` is fatal to the run at the point it occurs, `Persist` is
/// isolated to a single entity, and `Dispatch` is never fatal (index
/// delivery is best-effort by design).
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A concurrent run of the same job is already in flight
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// A structurally required read failed or returned corrupt data
    #[error("Data access failed: {operation}")]
    DataAccess {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// A single entity save failed; the surrounding run continues
    #[error("Persist failed for {entity} id={id}")]
    Persist {
        entity: &'static str,
        id: i32,
        #[source]
        source: anyhow::Error,
    },

    /// An index-channel send failed; never fatal to a run
    #[error("Dispatch to '{destination}' failed")]
    Dispatch {
        destination: String,
        #[source]
        source: anyhow::Error,
    },

    /// Connection pool error
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn data_access<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        AppError::DataAccess {
            operation: operation.into(),
            source: source.into(),
        }
    }

    pub fn persist<E>(entity: &'static str, id: i32, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        AppError::Persist {
            entity,
            id,
            source: source.into(),
        }
    }

    pub fn dispatch<E>(destination: impl Into<String>, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        AppError::Dispatch {
            destination: destination.into(),
            source: source.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for AppError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::from(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
