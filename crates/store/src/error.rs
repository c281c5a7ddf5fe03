use common::BookId;
use thiserror::Error;

/// Errors that can occur in the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A checkout line asked for more copies than the locked book row
    /// has in stock.
    #[error("insufficient stock for {title:?}: requested {requested}, available {available}")]
    InsufficientStock {
        title: String,
        requested: u32,
        available: u32,
    },

    /// A checkout line referenced a book that no longer exists.
    #[error("book {0} no longer exists")]
    BookMissing(BookId),

    /// A stored row violates an invariant the schema should enforce.
    #[error("inconsistent row: {0}")]
    Inconsistent(&'static str),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
