//! Relational paste store backed by SQLite.
//!
//! The engine maintains the expiry index itself, so saves are plain upserts
//! and sweeps are a single range delete.

mod schema;

pub use crate::constants::SQLITE_FILE_NAME;

use self::schema::{DELETE_EXPIRED, DELETE_PASTE, SCHEMA, SELECT_PASTE, UPSERT_PASTE};
use crate::{
    context::Context,
    error::StoreError,
    models::paste::Paste,
    store::{PasteStore, StoreBackend},
};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Paste store over a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
    path: PathBuf,
}

fn resolve_db_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(SQLITE_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

fn configure_connection(conn: &Connection) -> Result<(), StoreError> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "Configured SQLite journal mode");
    conn.pragma_update(None, "synchronous", "FULL")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn to_nanos(at: DateTime<Utc>, field: &str) -> Result<i64, StoreError> {
    at.timestamp_nanos_opt().ok_or_else(|| {
        StoreError::InvalidArgument(format!("{} {} is out of range", field, at))
    })
}

/// Sweep cutoffs saturate instead of failing so any instant is a valid cutoff.
fn cutoff_nanos(before: DateTime<Utc>) -> i64 {
    match before.timestamp_nanos_opt() {
        Some(nanos) => nanos,
        None if before.timestamp() < 0 => i64::MIN,
        None => i64::MAX,
    }
}

fn paste_from_row(row: &Row<'_>) -> rusqlite::Result<(Paste, Vec<u8>)> {
    let content: Vec<u8> = row.get(1)?;
    let size: i64 = row.get(6)?;
    let size =
        usize::try_from(size).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(6, size))?;
    let created_at: i64 = row.get(3)?;
    let expires_at: Option<i64> = row.get(4)?;
    let paste = Paste {
        id: row.get(0)?,
        content: String::new(),
        syntax: row.get(2)?,
        created_at: Utc.timestamp_nanos(created_at),
        expires_at: expires_at.map(|nanos| Utc.timestamp_nanos(nanos)),
        password_hash: row.get(5)?,
        size,
    };
    Ok((paste, content))
}

impl SqliteStore {
    /// Open or create the SQLite database at `path` and apply the schema.
    ///
    /// # Arguments
    /// - `path`: Database file, or an existing directory to hold [`SQLITE_FILE_NAME`].
    ///
    /// # Returns
    /// A ready-to-use [`SqliteStore`].
    ///
    /// # Errors
    /// Returns an error when the file cannot be opened or the schema cannot be
    /// applied. The connection is closed before any error is returned.
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

        let conn = Connection::open(&path)?;
        if let Err(err) = configure_connection(&conn) {
            if let Err((_, close_err)) = conn.close() {
                tracing::warn!(
                    "Failed to close SQLite connection after setup error: {}",
                    close_err
                );
            }
            return Err(err);
        }

        tracing::debug!(path = %path.display(), "SQLite paste store ready");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path,
        })
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self, ctx: &Context) -> Result<MutexGuard<'_, Option<Connection>>, StoreError> {
        ctx.check()?;
        let guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::StorageMessage("SQLite connection lock poisoned".to_string()))?;
        ctx.check()?;
        Ok(guard)
    }
}

impl PasteStore for SqliteStore {
    fn save(&self, ctx: &Context, paste: &Paste) -> Result<(), StoreError> {
        paste.validate()?;
        let created_at = to_nanos(paste.created_at, "created_at")?;
        let expires_at = paste
            .expires_at
            .map(|expires_at| to_nanos(expires_at, "expires_at"))
            .transpose()?;
        let size = i64::try_from(paste.size).map_err(|_| {
            StoreError::InvalidArgument(format!("size {} is out of range", paste.size))
        })?;

        let guard = self.lock(ctx)?;
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        conn.execute(
            UPSERT_PASTE,
            params![
                paste.id,
                paste.content.as_bytes(),
                paste.syntax,
                created_at,
                expires_at,
                paste.password_hash,
                size,
            ],
        )?;
        Ok(())
    }

    fn get(&self, ctx: &Context, id: &str) -> Result<Paste, StoreError> {
        let (mut paste, content) = {
            let guard = self.lock(ctx)?;
            let conn = guard.as_ref().ok_or(StoreError::Closed)?;
            conn.query_row(SELECT_PASTE, params![id], paste_from_row)
                .optional()?
                .ok_or(StoreError::NotFound)?
        };
        paste.content = String::from_utf8(content).map_err(|err| {
            StoreError::StorageMessage(format!("Paste '{}' content is not UTF-8: {}", id, err))
        })?;
        Ok(paste)
    }

    fn delete(&self, ctx: &Context, id: &str) -> Result<(), StoreError> {
        let guard = self.lock(ctx)?;
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        match conn.execute(DELETE_PASTE, params![id])? {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }

    fn delete_expired(&self, ctx: &Context, before: DateTime<Utc>) -> Result<usize, StoreError> {
        let cutoff = cutoff_nanos(before);
        let guard = self.lock(ctx)?;
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(conn.execute(DELETE_EXPIRED, params![cutoff])?)
    }

    fn close(&self) -> Result<(), StoreError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::StorageMessage("SQLite connection lock poisoned".to_string()))?;
        let Some(conn) = guard.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, err)| StoreError::Sqlite(err))?;
        tracing::debug!(path = %self.path.display(), "Closed SQLite paste store");
        Ok(())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Sqlite
    }
}

#[cfg(test)]
mod tests;
