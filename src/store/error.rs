use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for store client operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A `Check` precondition did not hold when the batch was applied
    #[error("Conflict on {namespace}/{id}: expected {expected}, found {actual}")]
    Conflict {
        namespace: String,
        id: String,
        expected: serde_json::Value,
        actual: serde_json::Value,
    },

    /// Write or query does not match the declared schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// A link names an entity that does not exist
    #[error("Entity not found: {namespace}/{id}")]
    MissingEntity { namespace: String, id: String },

    /// Database unreachable or authentication failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// SQL errors, constraint violations
    #[error("Database error: {0}")]
    Database(String),

    /// Connection pool issues
    #[error("Pool error: {0}")]
    Pool(String),

    /// Stored or submitted JSON could not be encoded/decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Convert tokio-postgres errors to store errors
impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_error) = err.as_db_error() {
            return StoreError::Database(format!(
                "{}: {}",
                db_error.code().code(),
                db_error.message()
            ));
        }

        StoreError::Database(format!("{:?}", err))
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<deadpool_postgres::BuildError> for StoreError {
    fn from(err: deadpool_postgres::BuildError) -> Self {
        StoreError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
