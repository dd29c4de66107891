//! In-memory paste store with the same expiry-index discipline as the
//! embedded backend. Nothing is persisted.

use crate::{
    context::Context,
    error::StoreError,
    models::paste::Paste,
    store::keys::{decode_expiry_timestamp, expiry_key, sweep_cutoff},
    store::{PasteStore, StoreBackend},
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
struct MemoryTables {
    pastes: BTreeMap<String, Paste>,
    by_expiry: BTreeMap<Vec<u8>, String>,
}

/// Paste store held entirely in process memory.
pub struct MemoryStore {
    tables: RwLock<Option<MemoryTables>>,
}

fn lock_poisoned() -> StoreError {
    StoreError::StorageMessage("Memory store lock poisoned".to_string())
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Some(MemoryTables::default())),
        }
    }

    /// Number of entries in the expiry index.
    ///
    /// # Errors
    /// [`StoreError::Closed`] after close.
    pub fn index_len(&self) -> Result<usize, StoreError> {
        let guard = self.tables.read().map_err(|_| lock_poisoned())?;
        let tables = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(tables.by_expiry.len())
    }

    fn write<T>(
        &self,
        ctx: &Context,
        op: impl FnOnce(&mut MemoryTables) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        ctx.check()?;
        let mut guard = self.tables.write().map_err(|_| lock_poisoned())?;
        ctx.check()?;
        let tables = guard.as_mut().ok_or(StoreError::Closed)?;
        op(tables)
    }
}

impl PasteStore for MemoryStore {
    fn save(&self, ctx: &Context, paste: &Paste) -> Result<(), StoreError> {
        paste.validate()?;
        self.write(ctx, |tables| {
            if let Some(previous_expiry) = tables
                .pastes
                .get(&paste.id)
                .and_then(|previous| previous.expires_at)
            {
                tables
                    .by_expiry
                    .remove(&expiry_key(previous_expiry, &paste.id));
            }
            tables.pastes.insert(paste.id.clone(), paste.clone());
            if let Some(expires_at) = paste.expires_at {
                tables
                    .by_expiry
                    .insert(expiry_key(expires_at, &paste.id), paste.id.clone());
            }
            Ok(())
        })
    }

    fn get(&self, ctx: &Context, id: &str) -> Result<Paste, StoreError> {
        ctx.check()?;
        let guard = self.tables.read().map_err(|_| lock_poisoned())?;
        let tables = guard.as_ref().ok_or(StoreError::Closed)?;
        tables.pastes.get(id).cloned().ok_or(StoreError::NotFound)
    }

    fn delete(&self, ctx: &Context, id: &str) -> Result<(), StoreError> {
        self.write(ctx, |tables| {
            let paste = tables.pastes.remove(id).ok_or(StoreError::NotFound)?;
            if let Some(expires_at) = paste.expires_at {
                tables.by_expiry.remove(&expiry_key(expires_at, id));
            }
            Ok(())
        })
    }

    fn delete_expired(&self, ctx: &Context, before: DateTime<Utc>) -> Result<usize, StoreError> {
        let cutoff = sweep_cutoff(before);
        self.write(ctx, |tables| {
            let Some(cutoff) = cutoff else {
                return Ok(0);
            };
            let mut removed = 0;
            while let Some(entry) = tables.by_expiry.first_entry() {
                if decode_expiry_timestamp(entry.key())? > cutoff {
                    break;
                }
                let id = entry.remove();
                if tables.pastes.remove(&id).is_some() {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    fn close(&self) -> Result<(), StoreError> {
        let mut guard = self.tables.write().map_err(|_| lock_poisoned())?;
        guard.take();
        Ok(())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}
