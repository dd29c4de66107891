//! redb table definitions for the embedded backend.

use redb::TableDefinition;

/// File name used when the configured path is a directory.
pub const REDB_FILE_NAME: &str = "tinypaste.redb";

/// Canonical paste rows (`Paste`, bincode-encoded).
pub const PASTES: TableDefinition<&str, &[u8]> = TableDefinition::new("pastes");
/// Expiry index: 8-byte big-endian expiry nanos ++ id bytes -> id.
pub const PASTES_BY_EXPIRY: TableDefinition<&[u8], &str> =
    TableDefinition::new("pastes_by_expiry");

pub(super) type PasteTable<'txn> = redb::Table<'txn, &'static str, &'static [u8]>;
pub(super) type ExpiryTable<'txn> = redb::Table<'txn, &'static [u8], &'static str>;
