//! Database error types.

/// Database operation errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// SQL error from sqlx
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// Data directory not found
    #[error("Config/data directory not found")]
    NoDataDir,

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Stored value could not be interpreted
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;
