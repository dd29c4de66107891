//! Data models shared by the store contract and its callers.

/// Paste record and expiry choices.
pub mod paste;
