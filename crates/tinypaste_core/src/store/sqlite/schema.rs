//! SQLite schema for the relational backend.

/// Idempotent schema. Timestamps are nanoseconds since the Unix epoch.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS pastes (
    id TEXT PRIMARY KEY,
    content BLOB NOT NULL,
    syntax TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    expires_at INTEGER,
    password_hash TEXT,
    size INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pastes_expires_at ON pastes (expires_at);
";

pub const UPSERT_PASTE: &str = "
INSERT INTO pastes (id, content, syntax, created_at, expires_at, password_hash, size)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT(id) DO UPDATE SET
    content = excluded.content,
    syntax = excluded.syntax,
    created_at = excluded.created_at,
    expires_at = excluded.expires_at,
    password_hash = excluded.password_hash,
    size = excluded.size
";

pub const SELECT_PASTE: &str = "
SELECT id, content, syntax, created_at, expires_at, password_hash, size
FROM pastes WHERE id = ?1
";

pub const DELETE_PASTE: &str = "DELETE FROM pastes WHERE id = ?1";

pub const DELETE_EXPIRED: &str =
    "DELETE FROM pastes WHERE expires_at IS NOT NULL AND expires_at <= ?1";
