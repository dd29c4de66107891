use super::*;
use std::sync::{Mutex, MutexGuard, OnceLock};

const VARS: [&str; 6] = [
    "DB_PATH",
    "STORE_BACKEND",
    "JANITOR_INTERVAL_SECS",
    "JANITOR_TIMEOUT_SECS",
    "JANITOR_ALLOW_OVERLAP",
    "HOME",
];

fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Snapshot of the config variables, restored on drop.
struct EnvSnapshot {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvSnapshot {
    fn clean() -> Self {
        let lock = env_lock();
        let saved = VARS.iter().map(|key| (*key, env::var(key).ok())).collect();
        for key in VARS {
            if key != "HOME" {
                env::remove_var(key);
            }
        }
        Self { saved, _lock: lock }
    }

    fn set(&self, key: &str, value: &str) {
        env::set_var(key, value);
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

#[test]
fn parse_env_flag_accepts_truthy_values() {
    for value in ["1", "true", "TRUE", " yes ", "on"] {
        assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
    }
}

#[test]
fn parse_env_flag_accepts_falsy_values() {
    for value in ["", "0", "false", "FALSE", " no ", "off"] {
        assert_eq!(parse_env_flag(value), Some(false), "value: {}", value);
    }
}

#[test]
fn parse_env_flag_rejects_unknown_values() {
    assert_eq!(parse_env_flag("maybe"), None);
    assert_eq!(parse_env_flag("enabled"), None);
}

#[test]
fn from_env_uses_defaults_when_unset() {
    let env = EnvSnapshot::clean();
    env.set("HOME", "/home/paster");

    let config = Config::from_env();
    assert_eq!(
        config.db_path,
        PathBuf::from("/home/paster/.cache/tinypaste/tinypaste.redb")
    );
    assert_eq!(config.backend, StoreBackend::Embedded);
    assert_eq!(config.janitor_interval, DEFAULT_JANITOR_INTERVAL);
    assert_eq!(config.janitor_timeout, DEFAULT_JANITOR_TIMEOUT);
    assert!(!config.janitor_allow_overlap);
}

#[test]
fn from_env_reads_every_variable() {
    let env = EnvSnapshot::clean();
    env.set("HOME", "/home/paster");
    env.set("DB_PATH", "~/pastes/db.sqlite3");
    env.set("STORE_BACKEND", "sqlite");
    env.set("JANITOR_INTERVAL_SECS", "30");
    env.set("JANITOR_TIMEOUT_SECS", "2");
    env.set("JANITOR_ALLOW_OVERLAP", "yes");

    let config = Config::from_env();
    assert_eq!(config.db_path, PathBuf::from("/home/paster/pastes/db.sqlite3"));
    assert_eq!(config.backend, StoreBackend::Sqlite);
    assert_eq!(config.janitor_interval, Duration::from_secs(30));
    assert_eq!(config.janitor_timeout, Duration::from_secs(2));
    assert!(config.janitor_allow_overlap);

    let store = config.store();
    assert_eq!(store.backend, StoreBackend::Sqlite);
    assert_eq!(store.db_path, config.db_path);
    assert_eq!(config.janitor().overlap, OverlapPolicy::Concurrent);
}

#[test]
fn default_db_path_follows_selected_backend() {
    let env = EnvSnapshot::clean();
    env.set("HOME", "/home/paster");
    env.set("STORE_BACKEND", "sqlite");

    assert_eq!(
        Config::from_env().db_path,
        PathBuf::from("/home/paster/.cache/tinypaste/tinypaste.sqlite3")
    );
}

#[test]
fn from_env_falls_back_on_malformed_values() {
    let env = EnvSnapshot::clean();
    env.set("STORE_BACKEND", "cassandra");
    env.set("JANITOR_INTERVAL_SECS", "soon");
    env.set("JANITOR_TIMEOUT_SECS", "-1");
    env.set("JANITOR_ALLOW_OVERLAP", "sometimes");

    let config = Config::from_env();
    assert_eq!(config.backend, StoreBackend::Embedded);
    assert_eq!(config.janitor_interval, DEFAULT_JANITOR_INTERVAL);
    assert_eq!(config.janitor_timeout, DEFAULT_JANITOR_TIMEOUT);
    assert!(!config.janitor_allow_overlap);
}

#[test]
fn absolute_db_path_is_kept_verbatim() {
    let env = EnvSnapshot::clean();
    env.set("DB_PATH", "/var/lib/tinypaste/store.redb");

    assert_eq!(
        Config::from_env().db_path,
        PathBuf::from("/var/lib/tinypaste/store.redb")
    );
}

#[test]
fn janitor_config_defaults_to_skip_overlap() {
    let config = Config {
        db_path: PathBuf::from("unused"),
        ..Config::default()
    };
    let janitor = config.janitor();
    assert_eq!(janitor.overlap, OverlapPolicy::Skip);
    assert_eq!(janitor.interval, DEFAULT_JANITOR_INTERVAL);
    assert_eq!(janitor.timeout, DEFAULT_JANITOR_TIMEOUT);
}
