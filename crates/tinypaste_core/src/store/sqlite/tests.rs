//! SQLite backend tests.

use super::{SqliteStore, SQLITE_FILE_NAME};
use crate::context::Context;
use crate::store::contract_tests::{now, paste_expiring, paste_store_contract_tests};
use crate::store::PasteStore;
use chrono::Duration;
use rusqlite::Connection;
use std::sync::Arc;
use tempfile::TempDir;

fn setup_store() -> (Arc<SqliteStore>, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let store = SqliteStore::open(dir.path().join("pastes.sqlite3")).expect("open store");
    (Arc::new(store), dir)
}

paste_store_contract_tests!(setup_store());

#[test]
fn schema_declares_expiry_index() {
    let (store, dir) = setup_store();
    store.close().expect("close");

    let conn = Connection::open(dir.path().join("pastes.sqlite3")).expect("inspect db");
    let index_sql: String = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'index' AND name = 'idx_pastes_expires_at'",
            [],
            |row| row.get(0),
        )
        .expect("expiry index exists");
    assert!(index_sql.contains("expires_at"));
}

#[test]
fn absent_optionals_are_stored_as_null() {
    let (store, dir) = setup_store();
    let ctx = Context::background();
    store
        .save(&ctx, &paste_expiring("nulls", None))
        .expect("save");
    store.close().expect("close");

    let conn = Connection::open(dir.path().join("pastes.sqlite3")).expect("inspect db");
    let (expires_at, password_hash): (Option<i64>, Option<String>) = conn
        .query_row(
            "SELECT expires_at, password_hash FROM pastes WHERE id = 'nulls'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("row exists");
    assert!(expires_at.is_none());
    assert!(password_hash.is_none());
}

#[test]
fn open_directory_path_uses_default_file_name() {
    let dir = TempDir::new().expect("temp dir");
    let store = SqliteStore::open(dir.path()).expect("open store");
    assert_eq!(store.path(), dir.path().join(SQLITE_FILE_NAME));
}

#[test]
fn reopen_preserves_records_and_applies_schema_idempotently() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("pastes.sqlite3");
    {
        let store = SqliteStore::open(&path).expect("open");
        store
            .save(
                &Context::background(),
                &paste_expiring("durable", Some(now() + Duration::hours(3))),
            )
            .expect("save");
        store.close().expect("close");
    }

    let store = SqliteStore::open(&path).expect("reopen");
    let ctx = Context::background();
    assert_eq!(
        store.get(&ctx, "durable").expect("get"),
        paste_expiring("durable", Some(now() + Duration::hours(3)))
    );
}
