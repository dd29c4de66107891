//! Error types for the paste store and its backends.
use thiserror::Error;

/// Top-level store error type.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Paste not found")]
    NotFound,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    #[error("Store is closed")]
    Closed,

    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Storage error: {0}")]
    StorageMessage(String),
}

/// Coarse error classification callers map outcomes onto.
///
/// Backend-specific variants all collapse into [`ErrorKind::Internal`] so the
/// caller layer never needs to know which engine produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Cancelled,
    Unavailable,
    Internal,
}

impl StoreError {
    /// Classify this error.
    ///
    /// # Returns
    /// The [`ErrorKind`] bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
            Self::Closed => ErrorKind::Unavailable,
            _ => ErrorKind::Internal,
        }
    }

    /// Whether this is the expected "no such paste" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}
