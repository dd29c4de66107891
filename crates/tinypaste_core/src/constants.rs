//! Shared defaults for the paste store and its janitor.

use std::time::Duration;

/// Default delay between janitor sweeps.
pub const DEFAULT_JANITOR_INTERVAL: Duration = Duration::from_secs(60);

/// Default upper bound on a single sweep.
pub const DEFAULT_JANITOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Directory under `$HOME` that holds the default database.
pub const DEFAULT_CACHE_DIR: &str = ".cache/tinypaste";

/// SQLite database file name used when the configured path is a directory.
pub const SQLITE_FILE_NAME: &str = "tinypaste.sqlite3";

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "tinypaste=info";
