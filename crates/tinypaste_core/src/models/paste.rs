//! Paste record model and expiry choices.

use crate::error::StoreError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stored paste.
///
/// Timestamps are UTC by construction. `expires_at == None` means the paste
/// never expires; `password_hash == None` means it is not protected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
    pub id: String,
    pub content: String,
    pub syntax: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    /// Byte length of `content` as recorded by the writer; the store never recomputes it.
    pub size: usize,
}

impl Paste {
    /// Build a new paste created at `now` with the chosen lifetime.
    ///
    /// # Arguments
    /// - `id`: Externally generated identifier.
    /// - `content`: Paste body.
    /// - `syntax`: Highlighting label from the caller's vocabulary.
    /// - `now`: Creation time.
    /// - `expiry`: Lifetime choice; [`ExpiryChoice::Never`] leaves `expires_at` unset.
    ///
    /// # Returns
    /// A [`Paste`] with `size` set to the content byte length.
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        syntax: impl Into<String>,
        now: DateTime<Utc>,
        expiry: ExpiryChoice,
    ) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            size: content.len(),
            content,
            syntax: syntax.into(),
            created_at: now,
            expires_at: expiry.duration().map(|lifetime| now + lifetime),
            password_hash: None,
        }
    }

    /// Attach a password hash. An empty hash leaves the paste unprotected.
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        self.password_hash = if hash.is_empty() { None } else { Some(hash) };
        self
    }

    pub fn has_expiration(&self) -> bool {
        self.expires_at.is_some()
    }

    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether the paste is past its expiry at `now`.
    ///
    /// A paste is still live at its exact expiry instant; it expires strictly after.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    /// Reject records the store cannot persist faithfully.
    ///
    /// # Errors
    /// [`StoreError::InvalidArgument`] when the id is empty or a timestamp is
    /// outside the nanosecond-representable range.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.id.is_empty() {
            return Err(StoreError::InvalidArgument(
                "paste id must not be empty".to_string(),
            ));
        }
        if self.created_at.timestamp_nanos_opt().is_none() {
            return Err(StoreError::InvalidArgument(format!(
                "created_at {} is out of range",
                self.created_at
            )));
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at.timestamp_nanos_opt().is_none() {
                return Err(StoreError::InvalidArgument(format!(
                    "expires_at {} is out of range",
                    expires_at
                )));
            }
        }
        Ok(())
    }
}

/// Lifetimes offered to paste authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExpiryChoice {
    TenMinutes,
    OneHour,
    OneDay,
    #[default]
    SevenDays,
    Never,
}

impl ExpiryChoice {
    /// Every choice, in display order.
    pub const ALL: [ExpiryChoice; 5] = [
        ExpiryChoice::TenMinutes,
        ExpiryChoice::OneHour,
        ExpiryChoice::OneDay,
        ExpiryChoice::SevenDays,
        ExpiryChoice::Never,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TenMinutes => "10m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
            Self::SevenDays => "7d",
            Self::Never => "never",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TenMinutes => "10 minutes",
            Self::OneHour => "1 hour",
            Self::OneDay => "1 day",
            Self::SevenDays => "7 days",
            Self::Never => "Never",
        }
    }

    /// Lifetime of a paste created with this choice; `None` for [`ExpiryChoice::Never`].
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::TenMinutes => Some(Duration::minutes(10)),
            Self::OneHour => Some(Duration::hours(1)),
            Self::OneDay => Some(Duration::days(1)),
            Self::SevenDays => Some(Duration::days(7)),
            Self::Never => None,
        }
    }
}

impl fmt::Display for ExpiryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryChoice {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|choice| choice.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| StoreError::InvalidArgument(format!("invalid expiration '{}'", value)))
    }
}
