//! Paste store contract and backend selection.
//!
//! Callers depend only on [`PasteStore`]; the embedded (redb), relational
//! (SQLite) and in-memory backends are interchangeable behind it.

/// Embedded single-file backend with a hand-maintained expiry index.
pub mod embedded;
/// Expiry index key encoding.
pub mod keys;
/// In-memory backend.
pub mod memory;
/// Relational backend.
#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::{context::Context, error::StoreError, models::paste::Paste};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub use embedded::EmbeddedStore;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Operations every paste backend provides.
///
/// All writes are atomic: a save or delete either fully applies (record and
/// expiry index together) or has no effect. Operations on the same id observe
/// a single total order.
pub trait PasteStore: Send + Sync {
    /// Insert or fully replace the paste with a matching id.
    ///
    /// # Errors
    /// [`StoreError::InvalidArgument`] for records that fail [`Paste::validate`];
    /// cancellation, closed-store, or backend errors otherwise.
    fn save(&self, ctx: &Context, paste: &Paste) -> Result<(), StoreError>;

    /// Fetch a paste by id, regardless of its expiry.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when no paste has this id.
    fn get(&self, ctx: &Context, id: &str) -> Result<Paste, StoreError>;

    /// Remove a paste and its expiry index entry.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when no paste has this id.
    fn delete(&self, ctx: &Context, id: &str) -> Result<(), StoreError>;

    /// Remove every paste whose expiry is set and `<= before`.
    ///
    /// # Returns
    /// Number of pastes removed. Pastes without an expiry are never touched.
    fn delete_expired(&self, ctx: &Context, before: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Release the underlying resources. Closing twice is a successful no-op.
    fn close(&self) -> Result<(), StoreError>;

    fn backend(&self) -> StoreBackend;
}

/// Available store implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreBackend {
    #[default]
    Embedded,
    Sqlite,
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }

    /// File name this backend uses when no explicit database path is given.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Embedded | Self::Memory => embedded::REDB_FILE_NAME,
            Self::Sqlite => crate::constants::SQLITE_FILE_NAME,
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "embedded" | "redb" => Ok(Self::Embedded),
            "sqlite" | "relational" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown store backend '{}'",
                other
            ))),
        }
    }
}

/// Settings needed to open a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub db_path: PathBuf,
}

/// Open the backend named by `config`.
///
/// # Returns
/// A shared handle to the opened store.
///
/// # Errors
/// Returns an error when the backend cannot be opened, or when the SQLite
/// backend is requested but compiled out.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn PasteStore>, StoreError> {
    let store: Arc<dyn PasteStore> = match config.backend {
        StoreBackend::Embedded => Arc::new(EmbeddedStore::open(&config.db_path)?),
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.db_path)?),
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite => {
            return Err(StoreError::InvalidArgument(
                "SQLite backend requested but this build lacks the `sqlite` feature".to_string(),
            ))
        }
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::info!(
        backend = %config.backend,
        path = %config.db_path.display(),
        "Opened paste store"
    );
    Ok(store)
}

/// Fetch a paste, treating pastes past their expiry as missing.
///
/// Expired pastes are left in place for the janitor to sweep.
///
/// # Errors
/// [`StoreError::NotFound`] when the paste is missing or expired at `now`.
pub fn get_unexpired(
    store: &dyn PasteStore,
    ctx: &Context,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Paste, StoreError> {
    let paste = store.get(ctx, id)?;
    if paste.is_expired_at(now) {
        return Err(StoreError::NotFound);
    }
    Ok(paste)
}

/// Close an optional store handle; `None` is a no-op.
///
/// # Errors
/// Propagates the backend's close error.
pub fn close_store(store: Option<&dyn PasteStore>) -> Result<(), StoreError> {
    match store {
        Some(store) => store.close(),
        None => Ok(()),
    }
}
