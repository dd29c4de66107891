//! Embedded paste store backed by a single redb file.
//!
//! Two tables live in the file: canonical paste rows keyed by id, and an
//! expiry index whose keys sort chronologically (see [`crate::store::keys`]).
//! Every mutation touches both tables inside one write transaction, so a
//! paste with an expiry always has exactly one index entry and a paste
//! without one has none.

mod tables;

pub use self::tables::{PASTES, PASTES_BY_EXPIRY, REDB_FILE_NAME};

use self::tables::{ExpiryTable, PasteTable};
use crate::{
    context::Context,
    error::StoreError,
    models::paste::Paste,
    store::keys::{decode_expiry_timestamp, expiry_key, sweep_cutoff},
    store::{PasteStore, StoreBackend},
};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Paste store over a single redb database file.
pub struct EmbeddedStore {
    db: RwLock<Option<Arc<redb::Database>>>,
    path: PathBuf,
}

/// Result of [`EmbeddedStore::check_integrity`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub rows: usize,
    pub expiring_rows: usize,
    pub index_entries: usize,
    /// Ids of index entries whose row is missing or carries a different expiry.
    pub orphaned_entries: Vec<String>,
    /// Ids of expiring rows with no matching index entry.
    pub missing_entries: Vec<String>,
}

impl IndexReport {
    pub fn is_consistent(&self) -> bool {
        self.orphaned_entries.is_empty()
            && self.missing_entries.is_empty()
            && self.expiring_rows == self.index_entries
    }
}

fn deserialize_paste(bytes: &[u8]) -> Result<Paste, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

fn lock_poisoned() -> StoreError {
    StoreError::StorageMessage("Embedded store handle lock poisoned".to_string())
}

/// Resolve the database file: directories get [`REDB_FILE_NAME`] appended.
fn resolve_db_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(REDB_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Commit unless the context died while the transaction was being built.
fn commit_if_live(ctx: &Context, write_txn: WriteTransaction) -> Result<(), StoreError> {
    if let Err(err) = ctx.check() {
        write_txn.abort()?;
        return Err(err);
    }
    write_txn.commit()?;
    Ok(())
}

impl EmbeddedStore {
    /// Open or create the database at `path` and initialize both tables.
    ///
    /// # Arguments
    /// - `path`: Database file, or an existing directory to hold [`REDB_FILE_NAME`].
    ///
    /// # Returns
    /// A ready-to-use [`EmbeddedStore`].
    ///
    /// # Errors
    /// Returns an error when the parent directory cannot be created, the file
    /// is already open elsewhere, or table initialization fails. The database
    /// handle is released before any error is returned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = resolve_db_file(path.as_ref());
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                StoreError::StorageMessage(format!(
                    "Failed to create database directory '{}': {}",
                    parent.display(),
                    err
                ))
            })?;
        }

        let db = redb::Database::create(&path)?;
        let write_txn = db.begin_write()?;
        write_txn.open_table(PASTES)?;
        write_txn.open_table(PASTES_BY_EXPIRY)?;
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Embedded paste store ready");
        Ok(Self {
            db: RwLock::new(Some(Arc::new(db))),
            path,
        })
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn handle(&self) -> Result<Arc<redb::Database>, StoreError> {
        let guard = self.db.read().map_err(|_| lock_poisoned())?;
        guard.clone().ok_or(StoreError::Closed)
    }

    /// Audit the expiry index against canonical rows without modifying either.
    ///
    /// # Returns
    /// An [`IndexReport`] describing row/index counts and any drift.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn check_integrity(&self, ctx: &Context) -> Result<IndexReport, StoreError> {
        ctx.check()?;
        let db = self.handle()?;
        let read_txn = db.begin_read()?;
        let pastes = read_txn.open_table(PASTES)?;
        let expiry = read_txn.open_table(PASTES_BY_EXPIRY)?;
        let mut report = IndexReport::default();

        for item in pastes.iter()? {
            let (_, value) = item?;
            let paste = deserialize_paste(value.value())?;
            report.rows += 1;
            let Some(expires_at) = paste.expires_at else {
                continue;
            };
            report.expiring_rows += 1;
            let key = expiry_key(expires_at, &paste.id);
            let indexed = expiry
                .get(key.as_slice())?
                .is_some_and(|guard| guard.value() == paste.id);
            if !indexed {
                report.missing_entries.push(paste.id);
            }
        }

        for item in expiry.iter()? {
            let (key, id) = item?;
            report.index_entries += 1;
            let id = id.value();
            let matches_row = match pastes.get(id)? {
                Some(guard) => deserialize_paste(guard.value())?
                    .expires_at
                    .is_some_and(|expires_at| expiry_key(expires_at, id) == key.value()),
                None => false,
            };
            if !matches_row {
                report.orphaned_entries.push(id.to_string());
            }
        }

        Ok(report)
    }
}

/// Pop index entries from the front while they are at or before `cutoff`.
///
/// Keys sort by expiry, so the first entry past the cutoff ends the scan.
fn sweep_expired(
    ctx: &Context,
    pastes: &mut PasteTable<'_>,
    expiry: &mut ExpiryTable<'_>,
    cutoff: u64,
) -> Result<usize, StoreError> {
    let mut removed = 0;
    loop {
        ctx.check()?;
        let (key, id) = match expiry.first()? {
            Some((key, id)) => (key.value().to_vec(), id.value().to_string()),
            None => break,
        };
        if decode_expiry_timestamp(&key)? > cutoff {
            break;
        }

        let row = match pastes.get(id.as_str())? {
            Some(guard) => Some(deserialize_paste(guard.value())?),
            None => None,
        };
        let row_matches = row
            .and_then(|paste| paste.expires_at)
            .is_some_and(|expires_at| expiry_key(expires_at, &id) == key);
        if row_matches {
            let _ = pastes.remove(id.as_str())?;
            removed += 1;
        } else {
            tracing::warn!(paste_id = %id, "Dropping stale expiry index entry");
        }
        let _ = expiry.pop_first()?;
    }
    Ok(removed)
}

impl PasteStore for EmbeddedStore {
    fn save(&self, ctx: &Context, paste: &Paste) -> Result<(), StoreError> {
        ctx.check()?;
        paste.validate()?;
        let encoded = bincode::serialize(paste)?;
        let db = self.handle()?;

        let write_txn = db.begin_write()?;
        {
            let mut pastes = write_txn.open_table(PASTES)?;
            let mut expiry = write_txn.open_table(PASTES_BY_EXPIRY)?;

            let previous = match pastes.get(paste.id.as_str())? {
                Some(guard) => Some(deserialize_paste(guard.value())?),
                None => None,
            };
            // Drop the old entry first; an upsert may move or clear the expiry.
            if let Some(previous_expiry) = previous.and_then(|previous| previous.expires_at) {
                let old_key = expiry_key(previous_expiry, &paste.id);
                let _ = expiry.remove(old_key.as_slice())?;
            }

            pastes.insert(paste.id.as_str(), encoded.as_slice())?;
            if let Some(expires_at) = paste.expires_at {
                let key = expiry_key(expires_at, &paste.id);
                expiry.insert(key.as_slice(), paste.id.as_str())?;
            }
        }
        commit_if_live(ctx, write_txn)
    }

    fn get(&self, ctx: &Context, id: &str) -> Result<Paste, StoreError> {
        ctx.check()?;
        let db = self.handle()?;
        let read_txn = db.begin_read()?;
        let pastes = read_txn.open_table(PASTES)?;
        let guard = pastes.get(id)?.ok_or(StoreError::NotFound)?;
        let paste = deserialize_paste(guard.value())?;
        Ok(paste)
    }

    fn delete(&self, ctx: &Context, id: &str) -> Result<(), StoreError> {
        ctx.check()?;
        let db = self.handle()?;

        let write_txn = db.begin_write()?;
        {
            let mut pastes = write_txn.open_table(PASTES)?;
            let mut expiry = write_txn.open_table(PASTES_BY_EXPIRY)?;

            let paste = match pastes.get(id)? {
                Some(guard) => deserialize_paste(guard.value())?,
                None => return Err(StoreError::NotFound),
            };
            if let Some(expires_at) = paste.expires_at {
                let key = expiry_key(expires_at, id);
                let _ = expiry.remove(key.as_slice())?;
            }
            let _ = pastes.remove(id)?;
        }
        commit_if_live(ctx, write_txn)
    }

    fn delete_expired(&self, ctx: &Context, before: DateTime<Utc>) -> Result<usize, StoreError> {
        ctx.check()?;
        let db = self.handle()?;
        let Some(cutoff) = sweep_cutoff(before) else {
            return Ok(0);
        };

        let write_txn = db.begin_write()?;
        let removed = {
            let mut pastes = write_txn.open_table(PASTES)?;
            let mut expiry = write_txn.open_table(PASTES_BY_EXPIRY)?;
            sweep_expired(ctx, &mut pastes, &mut expiry, cutoff)?
        };
        commit_if_live(ctx, write_txn)?;
        Ok(removed)
    }

    fn close(&self) -> Result<(), StoreError> {
        let mut guard = self.db.write().map_err(|_| lock_poisoned())?;
        if guard.take().is_some() {
            tracing::debug!(path = %self.path.display(), "Closed embedded paste store");
        }
        Ok(())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Embedded
    }
}
