//! Core library for tinypaste: paste records, interchangeable stores with
//! expiry-indexed sweeps, and the janitor that drives them.

/// Configuration loading and defaults.
pub mod config;
/// Shared default values.
pub mod constants;
/// Cancellation and deadlines for store calls.
pub mod context;
/// Store error types.
pub mod error;
/// Periodic expired-paste sweeper.
pub mod janitor;
/// Data models for persistence.
pub mod models;
/// Store contract and backends.
pub mod store;

pub use config::Config;
pub use context::Context;
pub use error::{ErrorKind, StoreError};
pub use janitor::{Janitor, JanitorConfig, OverlapPolicy, SweepOutcome};
pub use models::paste::{ExpiryChoice, Paste};
pub use store::{
    close_store, get_unexpired, open_store, PasteStore, StoreBackend, StoreConfig,
};
