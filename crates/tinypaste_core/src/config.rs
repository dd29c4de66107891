//! Configuration loading from environment variables.

use crate::constants::{DEFAULT_CACHE_DIR, DEFAULT_JANITOR_INTERVAL, DEFAULT_JANITOR_TIMEOUT};
use crate::janitor::{JanitorConfig, OverlapPolicy};
use crate::store::{StoreBackend, StoreConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration for the paste daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub backend: StoreBackend,
    pub janitor_interval: Duration,
    pub janitor_timeout: Duration,
    pub janitor_allow_overlap: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(StoreBackend::default()),
            backend: StoreBackend::default(),
            janitor_interval: DEFAULT_JANITOR_INTERVAL,
            janitor_timeout: DEFAULT_JANITOR_TIMEOUT,
            janitor_allow_overlap: false,
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    env::current_dir().ok()
}

fn default_db_path(backend: StoreBackend) -> PathBuf {
    resolve_home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_CACHE_DIR)
        .join(backend.default_file_name())
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read `name` and parse it with `parse`, keeping `default` when the
/// variable is unset or malformed.
fn env_or<T, F>(name: &str, default: T, parse: F) -> T
where
    F: FnOnce(&str) -> Option<T>,
{
    match env::var(name) {
        Ok(raw) => match parse(&raw) {
            Some(value) => value,
            None => {
                tracing::warn!(
                    variable = name,
                    value = %raw,
                    "Ignoring unparseable environment value; using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_secs(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or malformed.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let backend = env_or("STORE_BACKEND", defaults.backend, |raw| {
            StoreBackend::from_str(raw).ok()
        });
        Self {
            db_path: env::var("DB_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(|path| expand_tilde(path.trim()))
                .unwrap_or_else(|| default_db_path(backend)),
            backend,
            janitor_interval: env_or(
                "JANITOR_INTERVAL_SECS",
                defaults.janitor_interval,
                parse_secs,
            ),
            janitor_timeout: env_or("JANITOR_TIMEOUT_SECS", defaults.janitor_timeout, parse_secs),
            janitor_allow_overlap: env_or(
                "JANITOR_ALLOW_OVERLAP",
                defaults.janitor_allow_overlap,
                parse_env_flag,
            ),
        }
    }

    pub fn store(&self) -> StoreConfig {
        StoreConfig {
            backend: self.backend,
            db_path: self.db_path.clone(),
        }
    }

    pub fn janitor(&self) -> JanitorConfig {
        let overlap = if self.janitor_allow_overlap {
            OverlapPolicy::Concurrent
        } else {
            OverlapPolicy::Skip
        };
        JanitorConfig::new(self.janitor_interval, self.janitor_timeout, overlap)
    }
}

#[cfg(test)]
mod tests;
