//! Expiration-status classification.
//!
//! Every date comparison in the crate goes through [`days_until`] and
//! [`ExpiryStatus::classify`], so the boundaries (0, 7 and 30 days) live in
//! exactly one place. "Today" is always passed in by the caller.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the `Urgent` band, in days.
pub const URGENT_DAYS: i64 = 7;

/// Upper bound (inclusive) of the `Warning` band, in days.
pub const WARNING_DAYS: i64 = 30;

/// Default look-ahead for "expiring soon" queries.
pub const DEFAULT_EXPIRING_WINDOW_DAYS: i64 = 30;

/// Status band for a certificate relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpiryStatus {
    Expired,
    Urgent,
    Warning,
    Ok,
}

impl ExpiryStatus {
    pub const ALL: [ExpiryStatus; 4] = [
        ExpiryStatus::Expired,
        ExpiryStatus::Urgent,
        ExpiryStatus::Warning,
        ExpiryStatus::Ok,
    ];

    /// Classify a day offset (expiration − today).
    pub fn classify(days: i64) -> Self {
        if days < 0 {
            ExpiryStatus::Expired
        } else if days <= URGENT_DAYS {
            ExpiryStatus::Urgent
        } else if days <= WARNING_DAYS {
            ExpiryStatus::Warning
        } else {
            ExpiryStatus::Ok
        }
    }

    /// Classify an expiration date against `today`.
    pub fn for_date(expiration: NaiveDate, today: NaiveDate) -> Self {
        Self::classify(days_until(expiration, today))
    }

    pub fn label(self) -> &'static str {
        match self {
            ExpiryStatus::Expired => "EXPIRED",
            ExpiryStatus::Urgent => "URGENT",
            ExpiryStatus::Warning => "WARNING",
            ExpiryStatus::Ok => "OK",
        }
    }
}

impl fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole days from `today` until `expiration`. Negative once expired.
pub fn days_until(expiration: NaiveDate, today: NaiveDate) -> i64 {
    expiration.signed_duration_since(today).num_days()
}

pub fn is_expired(days: i64) -> bool {
    days < 0
}

/// `true` when the offset falls inside `[0, window]`.
pub fn is_expiring_within(days: i64, window: i64) -> bool {
    (0..=window).contains(&days)
}
